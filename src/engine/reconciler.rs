//! 完整性校验
//!
//! 用评分方案核对抽取结果：
//! - 不在方案中的条目（幻影题目）丢弃并记录日志
//! - 方案中没有对应条目的题目记为缺失，交给补充评分

use std::collections::HashSet;
use tracing::{debug, warn};

use super::normalizer::{normalize_label, NormalizedKey};
use crate::models::{ExpectedManifest, GradedItem, ManifestEntry};

/// 校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// 保留的条目，保持原顺序
    pub items: Vec<GradedItem>,
    /// 缺失的方案条目，保持方案顺序
    pub missing: Vec<ManifestEntry>,
    /// 被丢弃的幻影题目
    pub phantoms: Vec<GradedItem>,
}

/// 用评分方案校验条目
///
/// 条目与方案条目的规范化题号相等，或一方包含另一方，即视为匹配并保留；
/// 缺失判定只看相等。包含匹配是启发式规则，短数字题号之间可能误配，见 [`NormalizedKey::overlaps`]。
pub fn reconcile(items: Vec<GradedItem>, manifest: &ExpectedManifest) -> Reconciliation {
    let manifest_keys: Vec<NormalizedKey> = manifest
        .entries
        .iter()
        .map(|entry| normalize_label(&entry.label))
        .collect();

    let mut kept = Vec::with_capacity(items.len());
    let mut phantoms = Vec::new();
    for item in items {
        let key = normalize_label(&item.label);
        if manifest_keys.iter().any(|m| m.overlaps(&key)) {
            kept.push(item);
        } else {
            warn!("👻 丢弃不在评分方案中的题目: {}", item.label);
            phantoms.push(item);
        }
    }

    let missing = missing_entries(&kept, &manifest.entries);

    debug!(
        "校验完成: 保留 {} 题，缺失 {} 题，丢弃 {} 题",
        kept.len(),
        missing.len(),
        phantoms.len()
    );

    Reconciliation {
        items: kept,
        missing,
        phantoms,
    }
}

/// 找出没有相等题号条目的方案条目，保持方案顺序
pub fn missing_entries(items: &[GradedItem], entries: &[ManifestEntry]) -> Vec<ManifestEntry> {
    let item_keys: HashSet<NormalizedKey> =
        items.iter().map(|item| normalize_label(&item.label)).collect();
    entries
        .iter()
        .filter(|entry| !item_keys.contains(&normalize_label(&entry.label)))
        .cloned()
        .collect()
}

/// 只保留与给定方案条目匹配的条目（补充评分回复使用）
pub fn retain_in_scope(items: Vec<GradedItem>, scope: &[ManifestEntry]) -> Vec<GradedItem> {
    let scope_keys: Vec<NormalizedKey> = scope.iter().map(|e| normalize_label(&e.label)).collect();
    items
        .into_iter()
        .filter(|item| {
            let key = normalize_label(&item.label);
            let in_scope = scope_keys.iter().any(|k| k.overlaps(&key));
            if !in_scope {
                warn!("👻 补充评分回复包含未请求的题目: {}", item.label);
            }
            in_scope
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(label: &str) -> GradedItem {
        GradedItem::new(label, 1.0, 2.0, "")
    }

    fn manifest(entries: &[(&str, f64)]) -> ExpectedManifest {
        let entries: Vec<ManifestEntry> = entries
            .iter()
            .map(|(label, max)| ManifestEntry::new(*label, *max))
            .collect();
        let declared_total = entries.iter().map(|e| e.max_marks).sum();
        ExpectedManifest {
            entries,
            declared_total,
        }
    }

    #[test]
    fn test_missing_entries_are_reported() {
        let m = manifest(&[("1a", 2.0), ("1b", 3.0), ("2a", 5.0)]);
        let r = reconcile(vec![item("1a"), item("Q2a")], &m);

        assert_eq!(r.items.len(), 2);
        assert_eq!(r.missing, vec![ManifestEntry::new("1b", 3.0)]);
        assert!(r.phantoms.is_empty());
    }

    #[test]
    fn test_phantom_items_are_dropped() {
        let m = manifest(&[("1", 2.0), ("2", 2.0)]);
        let r = reconcile(vec![item("1"), item("Bonus 7"), item("2")], &m);

        let kept: Vec<&str> = r.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(kept, vec!["1", "2"]);
        assert_eq!(r.phantoms, vec![item("Bonus 7")]);
        assert!(r.missing.is_empty());
    }

    #[test]
    fn test_section_prefix_mismatch_is_retained() {
        let m = manifest(&[("1a", 2.0)]);
        let r = reconcile(vec![item("Section A 1a")], &m);

        assert_eq!(r.items.len(), 1);
        // 包含匹配只影响保留，缺失判定仍要求相等
        assert_eq!(r.missing, vec![ManifestEntry::new("1a", 2.0)]);
    }

    #[test]
    fn test_no_returned_item_is_unmatched() {
        let m = manifest(&[("Section A 1", 2.0), ("Section B 2", 2.0)]);
        let items = vec![item("Section A 1"), item("Section C 9"), item("3"), item("Section B 2")];
        let r = reconcile(items, &m);

        let keys: Vec<NormalizedKey> = m.entries.iter().map(|e| normalize_label(&e.label)).collect();
        for kept in &r.items {
            let key = normalize_label(&kept.label);
            assert!(keys.iter().any(|k| k.overlaps(&key)));
        }
        assert_eq!(r.phantoms.len(), 2);
    }

    #[test]
    fn test_retain_in_scope() {
        let scope = vec![ManifestEntry::new("1b", 3.0)];
        let kept = retain_in_scope(vec![item("1b"), item("4")], &scope);
        assert_eq!(kept, vec![item("1b")]);
    }

    #[test]
    fn test_missing_entries_after_merge() {
        let entries = vec![ManifestEntry::new("1a", 2.0), ManifestEntry::new("1b", 3.0)];
        assert_eq!(
            missing_entries(&[item("1a")], &entries),
            vec![ManifestEntry::new("1b", 3.0)]
        );
        assert!(missing_entries(&[item("Q1b"), item("1a")], &entries).is_empty());
    }
}
