use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::text::format_marks;

/// 评分方案中的一道题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub label: String,
    pub max_marks: f64,
}

impl ManifestEntry {
    pub fn new(label: impl Into<String>, max_marks: f64) -> Self {
        Self {
            label: label.into(),
            max_marks,
        }
    }
}

/// 以 `label(maxMarks)` 形式输出，补充请求直接使用这个格式
impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.label, format_marks(self.max_marks))
    }
}

/// 叙述尾部 `[MARK SCHEME SUMMARY]` 块描述的完整题目清单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedManifest {
    pub entries: Vec<ManifestEntry>,
    /// 块中声明的总分；未声明时为各题满分之和
    pub declared_total: f64,
}

impl ExpectedManifest {
    /// 各题满分之和
    pub fn entries_total(&self) -> f64 {
        self.entries.iter().map(|e| e.max_marks).sum()
    }
}
