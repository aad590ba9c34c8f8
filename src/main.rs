use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use grading_narrative::models::load_grading_request;
use grading_narrative::utils::logging;
use grading_narrative::{
    Config, GradingCtx, GradingFlow, GradingRequest, LlmService, NarrativeGenerator,
    ScriptedGenerator,
};

const USAGE: &str = "用法: grading_narrative <narrative.txt> [request.toml]";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = match std::env::var("GRADER_CONFIG") {
        Ok(path) => Config::from_toml_file(&path)?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init_with_verbosity(config.verbose_logging);
    logging::log_startup(&config);

    let mut args = std::env::args().skip(1);
    let Some(narrative_path) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };

    let narrative = tokio::fs::read_to_string(&narrative_path)
        .await
        .with_context(|| format!("读取评分叙述失败: {}", narrative_path.display()))?;

    let request = match args.next() {
        Some(path) => load_grading_request(Path::new(&path)).await?,
        None => GradingRequest::new(file_title(&narrative_path), ""),
    };

    let mut config = config;
    let generator: Arc<dyn NarrativeGenerator> = if config.has_llm_credentials() {
        Arc::new(LlmService::new(&config))
    } else {
        warn!("未配置 LLM_API_KEY，补充评分已关闭");
        config.gap_fill_enabled = false;
        // 叙述已在手，`finish` 不会再请求生成服务
        Arc::new(ScriptedGenerator::default())
    };

    let flow = GradingFlow::new(&config, generator)?;
    let ctx = GradingCtx::new(1, request);
    info!("{} 📄 叙述来自 {}", ctx, narrative_path.display());

    let report = flow.finish(&ctx, narrative).await;
    logging::log_report(&report);

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
