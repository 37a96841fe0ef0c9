//! FX 주간 리포트 CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use fxdesk_core::{init_logging, DataContext, LogConfig};
use fxdesk_collector::{Collector, CollectorConfig};
use fxdesk_report::{DeepSeekClient, ReportGenerator};

#[derive(Parser)]
#[command(name = "fxdesk-collector")]
#[command(about = "FX weekly report collector, generator and numeric audit", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 데이터 수집 후 DataContext JSON 출력
    Collect {
        /// 저장 경로 (없으면 표준 출력)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// 수집 → 리포트 생성 → 수치 감사
    Report {
        /// 리포트 저장 경로 (없으면 표준 출력)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// 저장된 DataContext와 리포트로 감사만 실행
    Audit {
        /// DataContext JSON 경로
        #[arg(long)]
        data: PathBuf,
        /// 리포트 텍스트 경로
        #[arg(long)]
        report: PathBuf,
    },
}

fn write_output(path: Option<&PathBuf>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("{} 저장 실패", path.display()))?;
            tracing::info!(path = %path.display(), "저장 완료");
        }
        None => println!("{}", content),
    }
    Ok(())
}

async fn collect(config: &CollectorConfig) -> (Collector, DataContext) {
    let collector = Collector::from_config(config);
    let mut progress = |step: usize, total: usize, message: &str| {
        tracing::info!("[{}/{}] {}", step, total, message);
    };
    let (ctx, _stats) = collector.collect(Some(&mut progress)).await;
    (collector, ctx)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    let log_format = LogConfig::from_env().format;
    init_logging(
        LogConfig::new(format!(
            "fxdesk_collector={0},fxdesk_data={0},fxdesk_audit={0},fxdesk_report={0}",
            cli.log_level
        ))
        .with_format(log_format),
    )
    .map_err(|e| anyhow::anyhow!("logging init failed: {}", e))?;

    tracing::info!("FxDesk Collector 시작");

    let config = CollectorConfig::from_env()?;
    tracing::debug!(credentials = ?config.credentials, proxy = ?config.proxy, "설정 로드 완료");

    match cli.command {
        Commands::Collect { output } => {
            let (_, ctx) = collect(&config).await;
            write_output(output.as_ref(), &ctx.to_json()?)?;
        }
        Commands::Report { output } => {
            let engine = config.audit_engine()?;
            let (collector, ctx) = collect(&config).await;

            let client = DeepSeekClient::new(collector.http(), config.deepseek());
            let mut generator = ReportGenerator::new(Arc::new(client)).with_engine(engine);
            let report = generator.generate(ctx).await?;
            tracing::info!("\n{}", generator.data_summary());
            write_output(output.as_ref(), &report)?;

            let audit = generator.audit()?;
            let summary = audit.summary();
            tracing::info!(
                is_valid = audit.is_valid,
                pass = summary.pass,
                fail = summary.fail,
                warning = summary.warning,
                "리포트 감사 완료"
            );
            println!("{}", audit.to_json()?);
        }
        Commands::Audit { data, report } => {
            let engine = config.audit_engine()?;
            let json = std::fs::read_to_string(&data)
                .with_context(|| format!("{} 읽기 실패", data.display()))?;
            let text = std::fs::read_to_string(&report)
                .with_context(|| format!("{} 읽기 실패", report.display()))?;
            let ctx = DataContext::from_json(&json)?;

            let audit = engine.audit_context(&ctx, &text);
            for record in audit.failures() {
                tracing::warn!(item = %record.item, msg = %record.msg, "불일치");
            }
            println!("{}", audit.to_json()?);
        }
    }

    tracing::info!("FxDesk Collector 종료");
    Ok(())
}
