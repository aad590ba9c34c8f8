use serde::{Deserialize, Serialize};

/// 抽取阶段产生的候选题目
///
/// `source_offset` 是题号在清洗后叙述中的位置，只用于保持顺序。
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateItem {
    pub label: String,
    pub awarded: f64,
    pub possible: f64,
    pub explanation: String,
    pub source_offset: usize,
}

impl CandidateItem {
    /// 转换为对外的评分条目
    pub fn into_graded(self) -> GradedItem {
        GradedItem {
            label: self.label,
            awarded: self.awarded,
            possible: self.possible,
            explanation: self.explanation,
        }
    }
}

/// 去重、校验后的评分条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedItem {
    /// 叙述中原样的题号
    pub label: String,
    pub awarded: f64,
    pub possible: f64,
    pub explanation: String,
}

impl GradedItem {
    pub fn new(
        label: impl Into<String>,
        awarded: f64,
        possible: f64,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            awarded,
            possible,
            explanation: explanation.into(),
        }
    }
}
