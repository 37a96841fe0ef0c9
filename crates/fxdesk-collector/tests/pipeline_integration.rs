//! 수집 파이프라인 통합 테스트.
//!
//! 모든 제공자를 하나의 mockito 서버로 돌려 전체 주기를 실행합니다.

use mockito::{Matcher, Server, ServerGuard};
use std::collections::HashMap;

use fxdesk_audit::{AuditEngine, AuditStatus};
use fxdesk_collector::{Collector, CollectorConfig};

const HKMA_PATH: &str =
    "/public/market-data-and-statistics/monthly-statistical-bulletin/er-ir/hk-interbank-ir-daily";

const BOARD: &str = r#"{"rc":0,"data":{"total":9,"diff":[
    {"f2":7.2563,"f12":"USDCNH","f14":"美元兑离岸人民币"},
    {"f2":7.8105,"f12":"USDHKD","f14":"美元兑港币"},
    {"f2":1.0712,"f12":"EURUSD","f14":"欧元兑美元"},
    {"f2":157.32,"f12":"USDJPY","f14":"美元兑日元"},
    {"f2":1.2689,"f12":"GBPUSD","f14":"英镑兑美元"},
    {"f2":0.6612,"f12":"AUDUSD","f14":"澳元兑美元"},
    {"f2":1.3741,"f12":"USDCAD","f14":"美元兑加元"},
    {"f2":0.8921,"f12":"USDCHF","f14":"美元兑瑞郎"},
    {"f2":104.37,"f12":"UDI","f14":"美元指数"}
]}}"#;

const CFETS: &str = r#"{"records":[
    {"date":"2024-06-14","values":["7.1134"]},
    {"date":"2024-06-13","values":["7.1140"]},
    {"date":"2024-06-12","values":["7.1122"]},
    {"date":"2024-06-11","values":["7.1148"]},
    {"date":"2024-06-07","values":["7.1097"]}
]}"#;

const SEARCH: &str = r#"{
    "choices":[{"message":{"content":"1. [POLICY]\nTITLE: Fed signals patience [1]\nSUMMARY: Officials want more evidence of disinflation. [1][2]"}}],
    "citations":["https://www.reuters.com/markets/fed","https://www.ft.com/content/fed"]
}"#;

fn config_for(server: &ServerGuard, extra: &[(&str, &str)]) -> CollectorConfig {
    let url = server.url();
    let mut env: HashMap<String, String> = [
        "FRED_BASE_URL",
        "CFETS_BASE_URL",
        "EASTMONEY_BASE_URL",
        "YAHOO_BASE_URL",
        "HKMA_BASE_URL",
        "PERPLEXITY_BASE_URL",
    ]
    .iter()
    .map(|key| (key.to_string(), url.clone()))
    .collect();
    env.insert("HTTP_MAX_RETRIES".into(), "0".into());
    env.insert("FETCH_MAX_ATTEMPTS".into(), "2".into());
    env.insert("FETCH_BACKOFF_MS".into(), "1".into());
    for (k, v) in extra {
        env.insert(k.to_string(), v.to_string());
    }
    CollectorConfig::from_lookup(|key| env.get(key).cloned()).unwrap()
}

const WITH_KEYS: [(&str, &str); 2] = [("FRED_API_KEY", "fred-test"), ("PERPLEXITY_API_KEY", "pplx-test")];

async fn mock_fred(server: &mut ServerGuard, series: &str, value: &str) {
    server
        .mock("GET", "/fred/series/observations")
        .match_query(Matcher::UrlEncoded("series_id".into(), series.into()))
        .with_status(200)
        .with_body(format!(
            r#"{{"observations":[{{"date":"2024-06-14","value":"."}},{{"date":"2024-06-13","value":"{}"}}]}}"#,
            value
        ))
        .create_async()
        .await;
}

#[tokio::test]
async fn test_all_providers_down_yields_explicit_nulls() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Any)
        .with_status(503)
        .with_body("service unavailable")
        .create_async()
        .await;
    server
        .mock("POST", Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let config = config_for(&server, &WITH_KEYS);
    let collector = Collector::from_config(&config);

    let mut messages = Vec::new();
    let mut progress = |_: usize, _: usize, msg: &str| messages.push(msg.to_string());
    let (ctx, stats) = collector.collect(Some(&mut progress)).await;

    // 파이프라인은 끝까지 실행
    assert_eq!(stats.steps, 6);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.degraded, 5);
    assert_eq!(messages.len(), 12);
    assert_eq!(messages[11], "✅ 计算完成");

    for key in ["us10y", "us2y", "vix", "fed_rate", "market_sentiment"] {
        assert!(ctx.macro_data.is_missing(key), "macro.{} should be null", key);
    }
    for key in [
        "usdcny_mid",
        "usdcny_mid_date",
        "usdcny_mid_high",
        "usdcny_mid_low",
        "usdcny_mid_range",
        "usdcnh_spot",
    ] {
        assert!(ctx.cny.is_missing(key), "cny.{} should be null", key);
    }
    for key in ["usdhkd", "hibor_overnight", "hibor_1w", "hibor_1m"] {
        assert!(ctx.hkd.is_missing(key), "hkd.{} should be null", key);
    }
    for key in ["eurusd", "usdjpy", "gbpusd", "audusd", "usdcad", "usdchf", "dxy"] {
        assert!(ctx.global_fx.is_missing(key), "global_fx.{} should be null", key);
    }

    // 피연산자가 없으면 파생 지표는 만들지 않음
    assert!(!ctx.cny.contains_key("cny_spread"));
    assert!(!ctx.hkd.contains_key("hkd_usd_spread"));
    assert!(!ctx.macro_data.contains_key("yield_curve"));

    assert!(ctx.news().is_empty());
    assert_eq!(ctx.count_data_points(), 0);
    // FRED 4 + 인민폐 2 + 홍콩달러 2 + 글로벌 7 + 뉴스 3
    assert_eq!(ctx.errors().len(), 18);
    assert!(ctx.errors().iter().any(|e| e.starts_with("DXY: ")));
    assert!(ctx.errors().iter().any(|e| e.starts_with("Perplexity POLICY: ")));

    // 직렬화하면 null로 남음
    let json = ctx.to_json().unwrap();
    assert!(json.contains("\"usdhkd\": null"));
    assert!(json.contains("\"data_points\": 0"));

    // 모든 값이 null이면 감사는 경고만 남기고 통과
    let audit = AuditEngine::default().audit_context(&ctx, "美元指数报104.5，中间价7.12。");
    assert!(audit.is_valid);
    assert!(audit.records.iter().all(|r| r.status == AuditStatus::Warning));
}

#[tokio::test]
async fn test_missing_credentials_short_circuit() {
    let server = Server::new_async().await;
    let config = config_for(&server, &[]);
    let collector = Collector::from_config(&config);

    let mut messages = Vec::new();
    let mut progress = |_: usize, _: usize, msg: &str| messages.push(msg.to_string());
    let (ctx, _stats) = collector.collect(Some(&mut progress)).await;

    assert_eq!(messages[1], "⚠️ FRED 未配置");
    assert_eq!(messages[9], "⚠️ Perplexity 未配置");
    assert!(ctx.errors().iter().any(|e| e == "FRED: FRED_API_KEY 未配置"));
    assert!(ctx
        .errors()
        .iter()
        .any(|e| e == "Perplexity: PERPLEXITY_API_KEY 未配置"));
    // 키가 없어도 담당 키는 명시적 null
    assert!(ctx.macro_data.is_missing("us10y"));
    assert!(ctx.macro_data.is_missing("fed_rate"));
}

#[tokio::test]
async fn test_healthy_providers_populate_context() {
    let mut server = Server::new_async().await;
    mock_fred(&mut server, "DGS10", "4.2534").await;
    mock_fred(&mut server, "DGS2", "4.70").await;
    mock_fred(&mut server, "VIXCLS", "12.5").await;
    mock_fred(&mut server, "FEDFUNDS", "5.33").await;

    server
        .mock("GET", "/ags/ms/cm-u-bk-ccpr/CcprHisNew")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(CFETS)
        .create_async()
        .await;
    let board = server
        .mock("GET", "/api/qt/clist/get")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(BOARD)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/v8/finance/chart/DX-Y.NYB")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":104.518},
            "indicators":{"quote":[{"close":[104.3,null]}]}}],"error":null}}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", HKMA_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"header":{"success":true},"result":{"records":[
                {"end_of_day":"2024-06-14","ir_overnight":4.61,"ir_1w":4.52,"ir_1m":4.68}
            ]}}"#,
        )
        .create_async()
        .await;
    let search = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer pplx-test")
        .with_status(200)
        .with_body(SEARCH)
        .expect(3)
        .create_async()
        .await;

    let config = config_for(&server, &WITH_KEYS);
    let collector = Collector::from_config(&config);
    let (ctx, stats) = collector.collect(None).await;

    assert!(ctx.errors().is_empty(), "unexpected errors: {:?}", ctx.errors());
    assert_eq!(stats.succeeded, 6);

    // 매크로
    assert_eq!(ctx.macro_data.number("us10y"), Some(4.25));
    assert_eq!(ctx.macro_data.number("us2y"), Some(4.7));
    assert_eq!(ctx.macro_data.number("vix"), Some(12.5));
    assert_eq!(ctx.macro_data.text("market_sentiment"), Some("乐观（低恐慌）"));
    assert_eq!(ctx.data_sources.get("vix").map(String::as_str), Some("CBOE/FRED"));

    // 인민폐
    assert_eq!(ctx.cny.number("usdcny_mid"), Some(7.1134));
    assert_eq!(ctx.cny.text("usdcny_mid_date"), Some("2024-06-14"));
    assert_eq!(ctx.cny.text("usdcny_mid_range"), Some("7.1097 - 7.1148"));
    assert_eq!(ctx.cny.number("usdcnh_spot"), Some(7.2563));
    assert_eq!(ctx.data_sources.get("usdcnh").map(String::as_str), Some("东方财富"));

    // 홍콩달러
    assert_eq!(ctx.hkd.number("usdhkd"), Some(7.8105));
    assert_eq!(ctx.hkd.text("lers_position"), Some("中间区间"));
    assert_eq!(ctx.hkd.number("hibor_overnight"), Some(4.61));
    assert_eq!(ctx.data_sources.get("hibor").map(String::as_str), Some("香港金管局"));

    // 글로벌: DXY는 Yahoo 우선, 통화쌍은 보드 한 번으로 모두 해결
    assert_eq!(ctx.global_fx.number("dxy"), Some(104.52));
    assert_eq!(ctx.data_sources.get("dxy").map(String::as_str), Some("Yahoo Finance"));
    assert_eq!(ctx.global_fx.number("usdjpy"), Some(157.32));
    assert_eq!(ctx.global_fx.number("usdchf"), Some(0.8921));
    board.assert_async().await;

    // 파생 지표
    assert_eq!(ctx.cny.number("cny_spread"), Some(0.1429));
    assert_eq!(ctx.hkd.number("hkd_usd_spread"), Some(-0.72));
    assert_eq!(ctx.macro_data.number("yield_curve"), Some(-0.45));

    // 뉴스: 분류 3개 × 1건
    search.assert_async().await;
    assert_eq!(ctx.news().len(), 3);
    assert_eq!(ctx.news()[0], "[POLICY] Fed signals patience");
    assert_eq!(ctx.news()[2], "[CNY] Fed signals patience");
    assert_eq!(
        ctx.news_sources()[0],
        vec![
            "https://www.reuters.com/markets/fed".to_string(),
            "https://www.ft.com/content/fed".to_string()
        ]
    );

    // 정확히 인용한 리포트는 통과, 틀린 값은 실패
    let engine = AuditEngine::default();
    let good = engine.audit_context(&ctx, "本周人民币中间价报7.1134，美元指数收于104.52，VIX 12.5。");
    assert!(good.is_valid);
    assert_eq!(good.record("美元指数").unwrap().status, AuditStatus::Pass);

    let bad = engine.audit_context(&ctx, "本周人民币中间价报7.30。");
    assert!(!bad.is_valid);
    assert_eq!(bad.record("USD/CNY 中间价").unwrap().status, AuditStatus::Fail);
}

#[tokio::test]
async fn test_second_cycle_served_from_cache() {
    let mut server = Server::new_async().await;
    let board = server
        .mock("GET", "/api/qt/clist/get")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(BOARD)
        .expect(1)
        .create_async()
        .await;

    let config = config_for(&server, &[]);
    let collector = Collector::from_config(&config);

    let (first, _) = collector.collect(None).await;
    let (second, _) = collector.collect(None).await;

    assert_eq!(first.cny.number("usdcnh_spot"), Some(7.2563));
    assert_eq!(second.cny.number("usdcnh_spot"), Some(7.2563));
    assert_eq!(second.global_fx.number("eurusd"), Some(1.0712));
    board.assert_async().await;

    collector.clear_cache().await;
    assert!(collector.cache().is_empty().await);
}

#[tokio::test]
#[ignore] // 실제 API 호출 필요
async fn test_live_collection() {
    let config = CollectorConfig::from_env().expect("설정 로드 실패");
    let collector = Collector::from_config(&config);
    let (ctx, stats) = collector.collect(None).await;

    println!("{}", ctx.to_json().expect("직렬화 실패"));
    for error in ctx.errors() {
        eprintln!("수집 오류: {}", error);
    }
    assert_eq!(stats.steps, 6);
    assert_eq!(stats.failed, 0);
}
