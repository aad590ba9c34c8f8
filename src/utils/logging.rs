/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{GapFillStatus, GradingReport};
use crate::utils::text::format_marks;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`。重复调用是安全的。
pub fn init() {
    init_with_verbosity(false);
}

/// 按配置初始化日志，`verbose` 为 true 时默认级别为 `debug`
pub fn init_with_verbosity(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 评分解析启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🤖 模型: {}", config.llm_model_name);
    info!(
        "🧩 补充评分: {}",
        if config.gap_fill_enabled { "开启" } else { "关闭" }
    );
    info!("{}", "=".repeat(60));
}

/// 打印评分报告摘要
pub fn log_report(report: &GradingReport) {
    let result = &report.result;
    info!("\n{}", "=".repeat(60));
    info!("📊 评分结果");
    info!("{}", "=".repeat(60));
    info!("题目数: {}", result.items.len());
    info!(
        "得分: {}/{} ({:.2}%) 等级: {}",
        format_marks(result.total_awarded),
        format_marks(result.total_possible),
        result.percentage(),
        result.grade
    );

    match &report.gap_fill {
        GapFillStatus::NotNeeded | GapFillStatus::Disabled => {}
        GapFillStatus::Filled {
            requested,
            recovered,
        } => info!("🧩 补充评分: 请求 {} 题，补回 {} 题", requested, recovered),
        GapFillStatus::Failed { requested, reason } => {
            warn!("🧩 补充评分失败 (请求 {} 题): {}", requested, reason)
        }
    }

    if !report.missing.is_empty() {
        let labels: Vec<String> = report.missing.iter().map(|e| e.to_string()).collect();
        warn!("⚠️ 仍缺失的题目: {}", labels.join(", "));
    }
    if let Some(declared) = report.declared_total_mismatch() {
        warn!(
            "⚠️ 满分与评分方案不一致: 方案 {} / 实际 {}",
            format_marks(declared),
            format_marks(result.total_possible)
        );
    }
    info!("{}", "=".repeat(60));
}
