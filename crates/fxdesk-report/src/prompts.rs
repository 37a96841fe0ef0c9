//! 리포트/추가질문 프롬프트.
//!
//! 리포트 프롬프트는 직렬화된 DataContext의 모든 null을 `"数据暂缺"`로 바꿔 넣습니다.
//! 모델이 null을 0이나 추정치로 채우지 않고 "데이터 없음"을 그대로 쓰게 하기 위함입니다.

use serde_json::Value;

use crate::anchors::{render_anchors, HistoryAnchor};

/// 누락 값 자리표시자.
pub const MISSING_PLACEHOLDER: &str = "数据暂缺";

/// (system, user) 프롬프트 쌍.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

const REPORT_SYSTEM: &str = "你是外汇市场分析师，负责撰写中文周度外汇市场报告。

【篇幅】
- 正文 1500-2000 字
- 第一至第三部分各 300-400 字，第四部分 200-300 字，第五部分 150-200 字

【数据规则】
1. 只能使用 <DATA> 中的数字、日期和事件，不得引入训练数据中的旧信息
2. 数字必须与 <DATA> 完全一致，不得四舍五入或换算
3. 值为“数据暂缺”的项目须在正文中明确写“数据暂缺”，不得推测
4. 不得用“约”“左右”等词修饰 <DATA> 中的精确数字
5. 引用数据时注明 data_sources 中的来源名称
6. 历史比较只能使用 <HISTORY_ANCHORS> 中的数值

【新闻】
- news 为短标题，news_detail 为详细摘要，写作时以 news_detail 为准
- 第一至第三部分结合相关新闻分析，第四部分整合其余要点，不重复

【输出】
- 不输出任何开场白或确认语句，直接从“## 一、人民币汇率分析”开始
- 正文中不得出现 <DATA>、<HISTORY_ANCHORS> 等标签文本
- 使用 Markdown，数据引用格式：数值（来源：来源名称）

【结构】
## 一、人民币汇率分析
## 二、港元汇率分析
## 三、全球外汇市场
## 四、本周重要事件
## 五、下周展望";

const FOLLOWUP_SYSTEM: &str = "你是外汇市场分析师，用户正在就一份已生成的外汇周报追问。

规则：
1. 回答只能基于【原始数据】与【已生成的报告】
2. 问题超出数据范围时，明确说明该信息不在本周数据中
3. 不得编造或推测数据中不存在的内容
4. 保持与报告一致的口径；若发现报告有误，依据原始数据指出并更正";

/// 재귀적으로 null → `"数据暂缺"`.
pub fn replace_nulls(value: Value) -> Value {
    match value {
        Value::Null => Value::String(MISSING_PLACEHOLDER.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(replace_nulls).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, replace_nulls(v)))
                .collect(),
        ),
        other => other,
    }
}

/// 리포트 생성 프롬프트.
pub fn report_prompt(data: &Value, anchors: &[HistoryAnchor]) -> serde_json::Result<PromptPair> {
    let cleaned = serde_json::to_string_pretty(&replace_nulls(data.clone()))?;
    let user = format!(
        "<DATA>\n{}\n</DATA>\n\n<HISTORY_ANCHORS>\n{}\n</HISTORY_ANCHORS>\n\n\
         请基于以上 <DATA> 撰写本周外汇市场周报。\n\
         - 判断当前汇率位置时参考 <HISTORY_ANCHORS>，不得凭记忆补充历史高低点\n\
         - 超出本次数据范围的时间比较使用“从形态上看”“类似”等非绝对表述\n\
         - 充分利用 news_detail 的内容，英文新闻须译成中文融入报告\n\
         - 标记为“数据暂缺”的项目照实说明",
        cleaned,
        render_anchors(anchors),
    );
    Ok(PromptPair {
        system: REPORT_SYSTEM.to_string(),
        user,
    })
}

/// 추가 질문 프롬프트.
pub fn followup_prompt(data_json: &str, report: &str, question: &str) -> PromptPair {
    PromptPair {
        system: FOLLOWUP_SYSTEM.to_string(),
        user: format!(
            "【原始数据】\n{}\n\n【已生成的报告】\n{}\n\n【用户追问】\n{}\n\n\
             请基于原始数据和报告回答；涉及数据或报告之外的信息时请明确说明。",
            data_json, report, question
        ),
    }
}
