//! 解析层（Engine）
//!
//! ## 职责
//!
//! 把生成服务返回的自由文本评分叙述，转换为经过校验的结构化分数。
//! 本层全部是同步、无状态、不会失败的纯函数：任何异常情况都退化为"可用的部分结果"。
//!
//! ## 数据流
//!
//! ```text
//! narrative
//!     ↓ extractor   (文法链 → CandidateItem)
//!     ↓ dedup       (按规范化题号去重，保持叙述顺序)
//!     ↓ manifest    (读取 [MARK SCHEME SUMMARY] 块，可能没有)
//!     ↓ reconciler  (丢弃幻影题目，找出缺失题目)
//!     ↓ (workflow::GapFillCoordinator 补充评分)
//!     ↓ aggregator  (求和 + 等级)
//! GradingResult
//! ```

pub mod aggregator;
pub mod dedup;
pub mod extractor;
pub mod manifest;
pub mod normalizer;
pub mod reconciler;

pub use aggregator::aggregate;
pub use dedup::{dedupe, dedupe_graded};
pub use extractor::{Candidates, Extractor, GrammarRule, PLACEHOLDER_LABEL};
pub use manifest::ManifestReader;
pub use normalizer::{normalize_label, NormalizedKey};
pub use reconciler::{missing_entries, reconcile, retain_in_scope, Reconciliation};

use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{ExpectedManifest, GradedItem, GradingResult, ManifestEntry};

/// 解析引擎参数
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub max_label_chars: usize,
    pub explanation_max_chars: usize,
    pub fallback_excerpt_chars: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_label_chars: 50,
            explanation_max_chars: 500,
            fallback_excerpt_chars: 500,
        }
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_label_chars: config.max_label_chars,
            explanation_max_chars: config.explanation_max_chars,
            fallback_excerpt_chars: config.fallback_excerpt_chars,
        }
    }
}

/// 补充评分之前的中间结果
#[derive(Debug, Clone)]
pub struct Draft {
    pub items: Vec<GradedItem>,
    pub manifest: Option<ExpectedManifest>,
    pub missing: Vec<ManifestEntry>,
    pub phantoms: Vec<GradedItem>,
}

/// 解析引擎
///
/// 不持有跨请求的状态，可在多个评分请求之间共享。
#[derive(Debug)]
pub struct GradingEngine {
    extractor: Extractor,
    manifest_reader: ManifestReader,
}

impl GradingEngine {
    pub fn new(options: EngineOptions) -> AppResult<Self> {
        Ok(Self {
            extractor: Extractor::new(options)?,
            manifest_reader: ManifestReader::new()?,
        })
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// 抽取 → 去重 → 读取方案 → 校验
    ///
    /// 只校验叙述中真实出现的条目；占位条目留给 [`GradingEngine::finalize`] 补上。
    pub fn draft(&self, narrative: &str) -> Draft {
        let items = dedupe_graded(self.extractor.scan(narrative));
        debug!("去重后 {} 个条目", items.len());

        let Some(manifest) = self.manifest_reader.read(narrative) else {
            info!("未找到评分方案，跳过完整性校验");
            return Draft {
                items,
                manifest: None,
                missing: Vec::new(),
                phantoms: Vec::new(),
            };
        };

        info!("📋 评分方案共 {} 题", manifest.entries.len());
        let reconciliation = reconcile(items, &manifest);
        Draft {
            items: reconciliation.items,
            manifest: Some(manifest),
            missing: reconciliation.missing,
            phantoms: reconciliation.phantoms,
        }
    }

    /// 解析补充评分回复：只保留请求范围内的条目，没有命中时返回空列表
    pub fn extract_follow_up(&self, fragment: &str, scope: &[ManifestEntry]) -> Vec<GradedItem> {
        let items = dedupe_graded(self.extractor.scan(fragment));
        retain_in_scope(items, scope)
    }

    /// 汇总最终条目；条目为空时补一个占位条目
    pub fn finalize(&self, mut items: Vec<GradedItem>, narrative: &str) -> GradingResult {
        if items.is_empty() {
            debug!("校验后没有剩余条目，使用占位条目");
            items.push(self.extractor.placeholder(narrative).into_graded());
        }
        aggregate(items)
    }

    /// 不做补充评分，直接得到结果
    pub fn grade(&self, narrative: &str) -> GradingResult {
        let draft = self.draft(narrative);
        self.finalize(draft.items, narrative)
    }
}
