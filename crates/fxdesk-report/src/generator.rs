//! 리포트 생성기.
//!
//! 한 주기의 DataContext를 받아 리포트를 생성하고, 같은 데이터와 리포트를 근거로
//! 추가 질문에 답하며, 마지막 리포트를 수치 감사합니다.

use std::sync::Arc;
use tracing::{info, warn};

use fxdesk_audit::{AuditEngine, AuditReport};
use fxdesk_core::{DataContext, Section};

use crate::anchors::{default_history_anchors, HistoryAnchor};
use crate::client::{ChatClient, ChatMessage, ChatRequest};
use crate::error::{ReportError, Result};
use crate::prompts::{followup_prompt, report_prompt, PromptPair};

/// 생성 파라미터.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f64,
    pub followup_max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 4000,
            temperature: 0.3,
            followup_max_tokens: 2000,
        }
    }
}

pub struct ReportGenerator {
    client: Arc<dyn ChatClient>,
    engine: AuditEngine,
    anchors: Vec<HistoryAnchor>,
    settings: GenerationSettings,
    context: Option<DataContext>,
    report: Option<String>,
    last_audit: Option<AuditReport>,
}

impl ReportGenerator {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            engine: AuditEngine::default(),
            anchors: default_history_anchors(),
            settings: GenerationSettings::default(),
            context: None,
            report: None,
            last_audit: None,
        }
    }

    pub fn with_engine(mut self, engine: AuditEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_anchors(mut self, anchors: Vec<HistoryAnchor>) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn context(&self) -> Option<&DataContext> {
        self.context.as_ref()
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn last_audit(&self) -> Option<&AuditReport> {
        self.last_audit.as_ref()
    }

    /// 리포트 생성. 컨텍스트와 본문을 보관하고, 이전 감사 결과는 폐기합니다.
    pub async fn generate(&mut self, ctx: DataContext) -> Result<String> {
        let data = ctx.to_value()?;
        let prompt = report_prompt(&data, &self.anchors)?;

        info!(
            client = self.client.name(),
            data_points = ctx.count_data_points(),
            errors = ctx.errors().len(),
            "리포트 생성 요청"
        );
        let report = self
            .client
            .complete(&request(prompt, self.settings.max_tokens, self.settings.temperature))
            .await?;
        info!(chars = report.chars().count(), "리포트 생성 완료");

        self.context = Some(ctx);
        self.report = Some(report.clone());
        self.last_audit = None;
        Ok(report)
    }

    /// 마지막 리포트에 대한 추가 질문.
    pub async fn answer_followup(&self, question: &str) -> Result<String> {
        let (Some(ctx), Some(report)) = (&self.context, &self.report) else {
            warn!("리포트 없이 추가 질문 요청");
            return Err(ReportError::NoReport);
        };

        let prompt = followup_prompt(&ctx.to_json()?, report, question);
        self.client
            .complete(&request(
                prompt,
                self.settings.followup_max_tokens,
                self.settings.temperature,
            ))
            .await
    }

    /// 마지막 리포트를 보관 중인 컨텍스트로 감사.
    pub fn audit(&mut self) -> Result<&AuditReport> {
        let (Some(ctx), Some(report)) = (&self.context, &self.report) else {
            return Err(ReportError::NoReport);
        };
        let audit = self.engine.audit_context(ctx, report);
        Ok(&*self.last_audit.insert(audit))
    }

    /// 화면 표시용 짧은 데이터 요약.
    pub fn data_summary(&self) -> String {
        match &self.context {
            Some(ctx) => summarize(ctx),
            None => "尚未采集数据".to_string(),
        }
    }
}

fn request(prompt: PromptPair, max_tokens: u32, temperature: f64) -> ChatRequest {
    ChatRequest {
        messages: vec![ChatMessage::system(prompt.system), ChatMessage::user(prompt.user)],
        max_tokens,
        temperature,
    }
}

fn display(section: &Section, key: &str) -> Option<String> {
    section.get(key).and_then(|v| v.as_ref()).map(|v| v.to_string())
}

fn summarize(ctx: &DataContext) -> String {
    let mut lines = Vec::new();

    let mut cny = Vec::new();
    if let Some(v) = display(&ctx.cny, "usdcny_mid") {
        cny.push(format!("中间价: {}", v));
    }
    if let Some(v) = display(&ctx.cny, "usdcnh_spot") {
        cny.push(format!("离岸: {}", v));
    }
    if let Some(v) = display(&ctx.cny, "usdcny_mid_range") {
        cny.push(format!("近期区间: {}", v));
    }
    if !cny.is_empty() {
        lines.push(format!("**人民币**: {}", cny.join(" | ")));
    }

    let mut hkd = Vec::new();
    if let Some(v) = display(&ctx.hkd, "usdhkd") {
        hkd.push(format!("USD/HKD: {}", v));
    }
    if let Some(v) = display(&ctx.hkd, "lers_position") {
        hkd.push(format!("区间: {}", v));
    }
    if let Some(v) = display(&ctx.hkd, "hibor_overnight") {
        hkd.push(format!("HIBOR隔夜: {}%", v));
    }
    if !hkd.is_empty() {
        lines.push(format!("**港元**: {}", hkd.join(" | ")));
    }

    let mut global = Vec::new();
    if let Some(v) = display(&ctx.global_fx, "dxy") {
        global.push(format!("DXY: {}", v));
    }
    if let Some(v) = display(&ctx.macro_data, "us10y") {
        global.push(format!("10Y: {}%", v));
    }
    if let Some(v) = display(&ctx.macro_data, "vix") {
        global.push(format!("VIX: {}", v));
    }
    if !global.is_empty() {
        lines.push(format!("**全球**: {}", global.join(" | ")));
    }

    let status = format!(
        "数据点: {} | 错误: {}",
        ctx.count_data_points(),
        ctx.errors().len()
    );
    if lines.is_empty() {
        status
    } else {
        format!("{}\n\n{}", lines.join("\n"), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fxdesk_audit::AuditStatus;
    use std::sync::Mutex;

    /// 고정 응답을 돌려주고 요청을 기록하는 클라이언트.
    struct CannedClient {
        reply: String,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl CannedClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatClient for CannedClient {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    fn sample_context() -> DataContext {
        let mut ctx = DataContext::new();
        ctx.cny.set_number("usdcny_mid", 7.1234);
        ctx.cny.set_missing("usdcnh_spot");
        ctx.hkd.set_number("usdhkd", 7.8123);
        ctx.hkd.set_text("lers_position", "中间区间");
        ctx.macro_data.set_number("vix", 0.0);
        ctx
    }

    #[tokio::test]
    async fn test_generate_sends_placeholder_for_nulls() {
        let client = CannedClient::new("## 一、人民币汇率分析\n中间价报7.1234。");
        let mut generator = ReportGenerator::new(client.clone());

        let report = generator.generate(sample_context()).await.unwrap();
        assert!(report.contains("7.1234"));
        assert!(generator.context().is_some());

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 4000);
        let user = &requests[0].messages[1].content;
        assert!(user.contains("\"usdcnh_spot\": \"数据暂缺\""));
        assert!(user.contains("<HISTORY_ANCHORS>"));
    }

    #[tokio::test]
    async fn test_followup_requires_report() {
        let generator = ReportGenerator::new(CannedClient::new("answer"));
        let err = generator.answer_followup("中间价是多少？").await.unwrap_err();
        assert!(matches!(err, ReportError::NoReport));
    }

    #[tokio::test]
    async fn test_followup_includes_report_and_question() {
        let client = CannedClient::new("报告正文");
        let mut generator = ReportGenerator::new(client.clone());
        generator.generate(sample_context()).await.unwrap();

        generator.answer_followup("港元处于什么区间？").await.unwrap();

        let requests = client.requests.lock().unwrap();
        let followup = &requests[1];
        assert_eq!(followup.max_tokens, 2000);
        assert!(followup.messages[1].content.contains("【已生成的报告】\n报告正文"));
        assert!(followup.messages[1].content.contains("港元处于什么区间？"));
    }

    #[tokio::test]
    async fn test_audit_last_report() {
        let client = CannedClient::new("本周人民币中间价报7.1234，USD/HKD 报7.90。");
        let mut generator = ReportGenerator::new(client);

        assert!(matches!(generator.audit(), Err(ReportError::NoReport)));

        generator.generate(sample_context()).await.unwrap();
        let audit = generator.audit().unwrap();
        assert!(!audit.is_valid);
        assert_eq!(audit.record("USD/CNY 中间价").unwrap().status, AuditStatus::Pass);
        assert_eq!(audit.record("USD/HKD").unwrap().status, AuditStatus::Fail);
        assert!(generator.last_audit().is_some());
    }

    #[test]
    fn test_data_summary() {
        let generator = ReportGenerator::new(CannedClient::new(""));
        assert_eq!(generator.data_summary(), "尚未采集数据");

        let ctx = sample_context();
        let summary = summarize(&ctx);
        assert!(summary.contains("**人民币**: 中间价: 7.1234"));
        assert!(!summary.contains("离岸"));
        assert!(summary.contains("区间: 中间区间"));
        // 0도 표시
        assert!(summary.contains("VIX: 0"));
        assert!(summary.ends_with("数据点: 4 | 错误: 0"));
    }
}
