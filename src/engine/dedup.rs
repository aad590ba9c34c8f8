//! 去重与排序

use std::collections::HashSet;
use tracing::debug;

use super::normalizer::normalize_label;
use crate::models::{CandidateItem, GradedItem};

/// 按叙述顺序保留每个规范化题号的第一次出现
///
/// 对自身输出再次调用结果不变。
pub fn dedupe(mut items: Vec<CandidateItem>) -> Vec<CandidateItem> {
    items.sort_by_key(|item| item.source_offset);

    let mut seen = HashSet::new();
    items.retain(|item| {
        let fresh = seen.insert(normalize_label(&item.label));
        if !fresh {
            debug!("丢弃重复题号: {}", item.label);
        }
        fresh
    });
    items
}

/// 去重后转换为对外条目
pub fn dedupe_graded(items: Vec<CandidateItem>) -> Vec<GradedItem> {
    dedupe(items)
        .into_iter()
        .map(CandidateItem::into_graded)
        .collect()
}
