//! 评分处理流程 - 流程层
//!
//! 核心职责：定义"一份评分请求"的完整处理流程
//!
//! 流程顺序：
//! 1. 流式生成评分叙述
//! 2. 抽取 → 去重 → 对照评分方案校验
//! 3. 缺失题目补充评分（最多一次）
//! 4. 汇总总分与等级

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::engine::{missing_entries, EngineOptions, GradingEngine};
use crate::error::AppResult;
use crate::models::{GapFillStatus, GradingReport};
use crate::services::{collect_fragments, NarrativeGenerator};
use crate::workflow::gap_fill::GapFillCoordinator;
use crate::workflow::grading_ctx::GradingCtx;

/// 评分处理流程
///
/// - 编排完整的评分流程
/// - 决定何时补充评分
/// - 只依赖解析引擎和生成服务
pub struct GradingFlow {
    engine: GradingEngine,
    generator: Arc<dyn NarrativeGenerator>,
    gap_fill_enabled: bool,
}

impl GradingFlow {
    pub fn new(config: &Config, generator: Arc<dyn NarrativeGenerator>) -> AppResult<Self> {
        Ok(Self {
            engine: GradingEngine::new(EngineOptions::from(config))?,
            generator,
            gap_fill_enabled: config.gap_fill_enabled,
        })
    }

    pub fn engine(&self) -> &GradingEngine {
        &self.engine
    }

    /// 生成叙述并完成评分
    ///
    /// 只有首轮生成失败会返回错误。
    pub async fn run(&self, ctx: &GradingCtx) -> AppResult<GradingReport> {
        info!("{} 📝 开始生成评分叙述", ctx);

        let stream = self.generator.stream_narrative(&ctx.request).await?;
        let narrative = collect_fragments(stream, |index, fragment| {
            debug!("{} 收到第 {} 段 ({} 字符)", ctx, index, fragment.len());
        })
        .await?;

        info!(
            "{} ✓ 叙述生成完成，共 {} 字符",
            ctx,
            narrative.chars().count()
        );

        Ok(self.finish(ctx, narrative).await)
    }

    /// 对已有的完整叙述评分
    pub async fn finish(&self, ctx: &GradingCtx, narrative: String) -> GradingReport {
        self.finish_with_cancel(ctx, narrative, std::future::pending())
            .await
    }

    /// 与 `finish` 相同，`cancel` 完成时放弃进行中的补充评分
    pub async fn finish_with_cancel<C>(
        &self,
        ctx: &GradingCtx,
        mut narrative: String,
        cancel: C,
    ) -> GradingReport
    where
        C: Future<Output = ()>,
    {
        let draft = self.engine.draft(&narrative);
        let phantoms: Vec<String> = draft.phantoms.iter().map(|i| i.label.clone()).collect();

        let (items, gap_fill) = if draft.missing.is_empty() {
            (draft.items, GapFillStatus::NotNeeded)
        } else if !self.gap_fill_enabled {
            info!("{} 补充评分已关闭，缺失 {} 题", ctx, draft.missing.len());
            (draft.items, GapFillStatus::Disabled)
        } else {
            let outcome = GapFillCoordinator::new(&self.engine, self.generator.as_ref())
                .run_with_cancel(ctx, draft.items, &draft.missing, cancel)
                .await;
            if let Some(addendum) = outcome.addendum {
                narrative.push_str("\n\n");
                narrative.push_str(&addendum);
            }
            (outcome.items, outcome.status)
        };

        let missing = draft
            .manifest
            .as_ref()
            .map(|manifest| missing_entries(&items, &manifest.entries))
            .unwrap_or_default();

        let result = self.engine.finalize(items, &narrative);
        info!(
            "{} 📊 评分完成: {} 题, {}/{} ({})",
            ctx,
            result.items.len(),
            result.total_awarded,
            result.total_possible,
            result.grade
        );

        GradingReport {
            result,
            narrative,
            manifest: draft.manifest,
            missing,
            phantoms,
            gap_fill,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GradingRequest, ManifestEntry};
    use crate::services::ScriptedGenerator;

    const NARRATIVE: &str = "\
1a Mark: 2/2 - Fine.
2a Mark: 3/5 - Some errors.

[MARK SCHEME SUMMARY]
1a(2), 1b(3), 2a(5)
Total: 10
[END SUMMARY]";

    fn ctx() -> GradingCtx {
        GradingCtx::new(1, GradingRequest::new("Mock", "answers"))
    }

    fn flow(config: &Config, generator: ScriptedGenerator) -> GradingFlow {
        GradingFlow::new(config, Arc::new(generator)).unwrap()
    }

    #[tokio::test]
    async fn test_disabled_gap_fill_reports_missing() {
        let config = Config {
            gap_fill_enabled: false,
            ..Config::default()
        };
        let generator = ScriptedGenerator::default().with_follow_up("1b Mark: 3/3 - ok.");
        let report = flow(&config, generator.clone())
            .finish(&ctx(), NARRATIVE.to_string())
            .await;

        assert_eq!(report.gap_fill, GapFillStatus::Disabled);
        assert_eq!(report.missing, vec![ManifestEntry::new("1b", 3.0)]);
        assert_eq!(report.result.total_possible, 7.0);
        assert_eq!(report.declared_total_mismatch(), Some(10.0));
        assert!(generator.follow_up_requests().is_empty());
    }

    #[tokio::test]
    async fn test_finish_offline_with_empty_generator() {
        let config = Config {
            gap_fill_enabled: false,
            ..Config::default()
        };
        let generator = ScriptedGenerator::default();
        let report = flow(&config, generator.clone())
            .finish(&ctx(), NARRATIVE.to_string())
            .await;

        assert_eq!(report.narrative, NARRATIVE);
        assert_eq!(report.result.items.len(), 2);
        assert_eq!(report.result.total_awarded, 5.0);
        assert!(generator.follow_up_requests().is_empty());
    }

    #[tokio::test]
    async fn test_addendum_is_appended_to_narrative() {
        let generator = ScriptedGenerator::default().with_follow_up("1b Mark: 3/3 - Excellent.");
        let report = flow(&Config::default(), generator)
            .finish(&ctx(), NARRATIVE.to_string())
            .await;

        assert!(report
            .narrative
            .ends_with("[END SUMMARY]\n\n1b Mark: 3/3 - Excellent."));
        assert!(report.missing.is_empty());
        assert_eq!(report.result.total_possible, 10.0);
        assert_eq!(report.declared_total_mismatch(), None);
    }

    #[tokio::test]
    async fn test_cancelled_gap_fill_keeps_draft() {
        let generator = ScriptedGenerator::default()
            .with_follow_up("1b Mark: 3/3 - Excellent.")
            .with_follow_up_delay(std::time::Duration::from_secs(30));
        let report = flow(&Config::default(), generator)
            .finish_with_cancel(&ctx(), NARRATIVE.to_string(), std::future::ready(()))
            .await;

        assert!(matches!(report.gap_fill, GapFillStatus::Failed { .. }));
        assert_eq!(report.result.items.len(), 2);
        assert_eq!(report.narrative, NARRATIVE);
    }
}
