//! 补充评分 - 流程层
//!
//! 对照评分方案发现缺失题目后，只针对这些题目再问一次生成服务，
//! 把回复解析出的条目并入已有结果。
//!
//! 补充评分永远不会让整个评分失败：请求出错或被取消时，沿用补充前的条目。

use std::collections::HashSet;
use std::future::Future;

use tracing::{info, warn};

use crate::engine::{normalize_label, GradingEngine, NormalizedKey};
use crate::models::{GapFillStatus, GradedItem, ManifestEntry};
use crate::services::NarrativeGenerator;
use crate::workflow::grading_ctx::GradingCtx;

/// 补充评分的结果
#[derive(Debug, Clone)]
pub struct GapFillOutcome {
    /// 合并后的条目
    pub items: Vec<GradedItem>,
    /// 生成服务的原始回复，需要追加到叙述末尾
    pub addendum: Option<String>,
    pub status: GapFillStatus,
}

/// 补充评分协调器
///
/// - 每次评分最多发起一次补充请求
/// - 请求范围只包含缺失题目
/// - 不持有任何跨请求的状态
pub struct GapFillCoordinator<'a> {
    engine: &'a GradingEngine,
    generator: &'a dyn NarrativeGenerator,
}

impl<'a> GapFillCoordinator<'a> {
    pub fn new(engine: &'a GradingEngine, generator: &'a dyn NarrativeGenerator) -> Self {
        Self { engine, generator }
    }

    pub async fn run(
        &self,
        ctx: &GradingCtx,
        items: Vec<GradedItem>,
        missing: &[ManifestEntry],
    ) -> GapFillOutcome {
        self.run_with_cancel(ctx, items, missing, std::future::pending())
            .await
    }

    /// 与 `run` 相同，`cancel` 先完成时放弃补充请求
    pub async fn run_with_cancel<C>(
        &self,
        ctx: &GradingCtx,
        items: Vec<GradedItem>,
        missing: &[ManifestEntry],
        cancel: C,
    ) -> GapFillOutcome
    where
        C: Future<Output = ()>,
    {
        if missing.is_empty() {
            return GapFillOutcome {
                items,
                addendum: None,
                status: GapFillStatus::NotNeeded,
            };
        }

        let requested = missing.len();
        let scope: Vec<String> = missing.iter().map(ToString::to_string).collect();
        info!("{} 🔁 补充评分 {} 题: {}", ctx, requested, scope.join(", "));

        let response = tokio::select! {
            response = self.generator.follow_up(&ctx.request, &scope) => response,
            _ = cancel => {
                warn!("{} ⏹ 补充评分已取消，沿用现有结果", ctx);
                return GapFillOutcome {
                    items,
                    addendum: None,
                    status: GapFillStatus::Failed {
                        requested,
                        reason: "已取消".to_string(),
                    },
                };
            }
        };

        match response {
            Ok(fragment) => {
                let additions = self.engine.extract_follow_up(&fragment, missing);
                let before = items.len();
                let items = merge_items(items, additions);
                let recovered = items.len() - before;
                info!("{} ✓ 补充评分完成，找回 {}/{} 题", ctx, recovered, requested);

                GapFillOutcome {
                    items,
                    addendum: Some(fragment),
                    status: GapFillStatus::Filled {
                        requested,
                        recovered,
                    },
                }
            }
            Err(e) => {
                warn!("{} ⚠️ 补充评分失败，沿用现有结果: {}", ctx, e);
                GapFillOutcome {
                    items,
                    addendum: None,
                    status: GapFillStatus::Failed {
                        requested,
                        reason: e.to_string(),
                    },
                }
            }
        }
    }
}

/// 合并条目：已有题号的条目保持不变，新条目按出现顺序追加在末尾
pub fn merge_items(existing: Vec<GradedItem>, additions: Vec<GradedItem>) -> Vec<GradedItem> {
    let mut seen: HashSet<NormalizedKey> =
        existing.iter().map(|item| normalize_label(&item.label)).collect();
    let mut merged = existing;
    for item in additions {
        if seen.insert(normalize_label(&item.label)) {
            merged.push(item);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::engine::EngineOptions;
    use crate::models::GradingRequest;
    use crate::services::ScriptedGenerator;

    fn engine() -> GradingEngine {
        GradingEngine::new(EngineOptions::default()).unwrap()
    }

    fn ctx() -> GradingCtx {
        GradingCtx::new(1, GradingRequest::new("Mock", "answers"))
    }

    fn existing() -> Vec<GradedItem> {
        vec![
            GradedItem::new("1a", 2.0, 2.0, "Fine."),
            GradedItem::new("2a", 3.0, 5.0, "Some errors."),
        ]
    }

    #[tokio::test]
    async fn test_gap_fill_recovers_missing_item() {
        let engine = engine();
        let generator = ScriptedGenerator::default().with_follow_up("1b Mark: 3/3 - Excellent.");
        let missing = vec![ManifestEntry::new("1b", 3.0)];

        let outcome = GapFillCoordinator::new(&engine, &generator)
            .run(&ctx(), existing(), &missing)
            .await;

        let labels: Vec<&str> = outcome.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["1a", "2a", "1b"]);
        assert_eq!(
            outcome.status,
            GapFillStatus::Filled {
                requested: 1,
                recovered: 1
            }
        );
        assert_eq!(outcome.addendum.as_deref(), Some("1b Mark: 3/3 - Excellent."));
        assert_eq!(generator.follow_up_requests(), vec![vec!["1b(3)".to_string()]]);
    }

    #[tokio::test]
    async fn test_gap_fill_failure_keeps_items() {
        let engine = engine();
        let generator = ScriptedGenerator::default();
        let missing = vec![ManifestEntry::new("1b", 3.0)];

        let outcome = GapFillCoordinator::new(&engine, &generator)
            .run(&ctx(), existing(), &missing)
            .await;

        assert_eq!(outcome.items, existing());
        assert!(outcome.addendum.is_none());
        assert!(matches!(
            outcome.status,
            GapFillStatus::Failed { requested: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_gap_fill_cancelled() {
        let engine = engine();
        let generator = ScriptedGenerator::default()
            .with_follow_up("1b Mark: 3/3 - Excellent.")
            .with_follow_up_delay(Duration::from_secs(30));
        let missing = vec![ManifestEntry::new("1b", 3.0)];

        let outcome = GapFillCoordinator::new(&engine, &generator)
            .run_with_cancel(&ctx(), existing(), &missing, std::future::ready(()))
            .await;

        assert_eq!(outcome.items, existing());
        assert!(matches!(outcome.status, GapFillStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_nothing_missing_skips_request() {
        let engine = engine();
        let generator = ScriptedGenerator::default();

        let outcome = GapFillCoordinator::new(&engine, &generator)
            .run(&ctx(), existing(), &[])
            .await;

        assert_eq!(outcome.status, GapFillStatus::NotNeeded);
        assert!(generator.follow_up_requests().is_empty());
    }

    #[test]
    fn test_merge_keeps_existing_items() {
        let additions = vec![
            GradedItem::new("Q1a", 0.0, 2.0, "Re-graded."),
            GradedItem::new("1b", 3.0, 3.0, "Excellent."),
        ];
        let merged = merge_items(existing(), additions.clone());

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], GradedItem::new("1a", 2.0, 2.0, "Fine."));
        assert_eq!(merge_items(merged.clone(), additions), merged);
    }
}
