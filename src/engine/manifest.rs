//! 评分方案读取
//!
//! 叙述末尾可能带有如下结构的块：
//!
//! ```text
//! [MARK SCHEME SUMMARY]
//! 1a(2), 1b(3), 2a(5)
//! Total: 10
//! [END SUMMARY]
//! ```
//!
//! 块缺失或格式不对都不是错误，只是跳过校验。

use phf::phf_set;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use super::normalizer::normalize_label;
use crate::error::AppResult;
use crate::models::{ExpectedManifest, ManifestEntry};
use crate::utils::text::{collapse_whitespace, strip_emphasis};

/// 这些"题号"只是汇总行，不是题目
static GENERIC_LABELS: phf::Set<&'static str> = phf_set! {
    "total",
    "totals",
    "total marks",
    "grand total",
    "summary",
    "overall",
    "sum",
    "marks",
    "mark",
};

/// 评分方案读取器
#[derive(Debug)]
pub struct ManifestReader {
    block: Regex,
    entry: Regex,
    total: Regex,
}

impl ManifestReader {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            // 缺少结束标记时读到文末
            block: Regex::new(
                r"(?is)\[[ \t]*mark[ \t]+scheme[ \t]+summary[ \t]*\](?P<body>.*?)(?:\[[ \t]*end[ \t]+summary[ \t]*\]|\z)",
            )?,
            entry: Regex::new(
                r"(?i)(?P<label>[a-z0-9][a-z0-9 \t().\-]*?)[ \t]*\([ \t]*(?P<max>-?\d+(?:\.\d+)?)[ \t]*(?:marks?)?[ \t]*\)",
            )?,
            total: Regex::new(
                r"(?im)^[ \t]*(?:[-•*][ \t]*)?(?:declared[ \t]+)?total(?:[ \t]+marks)?[ \t]*[:=][ \t]*(?P<total>\d+(?:\.\d+)?)[^\n]*$",
            )?,
        })
    }

    /// 读取评分方案；没有块或块内没有有效条目时返回 `None`
    pub fn read(&self, narrative: &str) -> Option<ExpectedManifest> {
        let text = strip_emphasis(narrative);
        let body = self.block.captures(text.as_ref())?.name("body")?.as_str();

        let declared = self
            .total
            .captures(body)
            .and_then(|caps| caps.name("total"))
            .and_then(|m| m.as_str().parse::<f64>().ok());
        let listing = self.total.replace_all(body, "");

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for caps in self.entry.captures_iter(&listing) {
            let (Some(label), Some(max)) = (caps.name("label"), caps.name("max")) else {
                continue;
            };
            let label = collapse_whitespace(label.as_str());
            let Ok(max_marks) = max.as_str().parse::<f64>() else {
                continue;
            };

            if GENERIC_LABELS.contains(label.to_lowercase().as_str()) {
                debug!("评分方案跳过汇总行: {}", label);
                continue;
            }
            if max_marks <= 0.0 {
                debug!("评分方案跳过非正分值条目: {}({})", label, max_marks);
                continue;
            }
            if !seen.insert(normalize_label(&label)) {
                debug!("评分方案跳过重复条目: {}", label);
                continue;
            }

            entries.push(ManifestEntry::new(label, max_marks));
        }

        if entries.is_empty() {
            debug!("评分方案块中没有有效条目");
            return None;
        }

        let declared_total =
            declared.unwrap_or_else(|| entries.iter().map(|e| e.max_marks).sum());
        Some(ExpectedManifest {
            entries,
            declared_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> ManifestReader {
        ManifestReader::new().unwrap()
    }

    fn labels(manifest: &ExpectedManifest) -> Vec<&str> {
        manifest.entries.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn test_reads_entries_and_total() {
        let narrative = "\
1a Mark: 2/2 - ok

**[MARK SCHEME SUMMARY]**
1a(2), 1b(3), 2a(5)
Total: 10
[END SUMMARY]
";
        let manifest = reader().read(narrative).unwrap();
        assert_eq!(labels(&manifest), vec!["1a", "1b", "2a"]);
        assert_eq!(manifest.entries[1].max_marks, 3.0);
        assert_eq!(manifest.declared_total, 10.0);
    }

    #[test]
    fn test_nested_and_sectioned_labels() {
        let narrative = "\
[MARK SCHEME SUMMARY]
- Section A 1(a)(2)
- Section A 1(b) (3 marks)
- Question 2(i)(2.5)
[END SUMMARY]";
        let manifest = reader().read(narrative).unwrap();
        assert_eq!(
            labels(&manifest),
            vec!["Section A 1(a)", "Section A 1(b)", "Question 2(i)"]
        );
        assert_eq!(manifest.entries[2].max_marks, 2.5);
        assert_eq!(manifest.declared_total, 7.5);
    }

    #[test]
    fn test_generic_and_non_positive_entries_are_skipped() {
        let narrative = "\
[MARK SCHEME SUMMARY]
1(4), 2(0), Total(4), Summary(4), 3(-1), 1(4)
[END SUMMARY]";
        let manifest = reader().read(narrative).unwrap();
        assert_eq!(labels(&manifest), vec!["1"]);
    }

    #[test]
    fn test_missing_end_marker_reads_to_end() {
        let narrative = "[MARK SCHEME SUMMARY]\nQ1(5), Q2(5)";
        let manifest = reader().read(narrative).unwrap();
        assert_eq!(labels(&manifest), vec!["Q1", "Q2"]);
    }

    #[test]
    fn test_absent_or_empty_block_is_none() {
        assert!(reader().read("1 Mark: 1/1 - fine").is_none());
        assert!(reader()
            .read("[MARK SCHEME SUMMARY]\nnothing here\n[END SUMMARY]")
            .is_none());
    }
}
