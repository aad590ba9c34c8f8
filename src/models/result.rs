use serde::{Deserialize, Serialize};

use super::grade::Grade;
use super::item::GradedItem;
use super::manifest::{ExpectedManifest, ManifestEntry};

/// 引擎对外的唯一产物
///
/// 总分始终由 `items` 重新求和，不采信叙述中自报的总分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub items: Vec<GradedItem>,
    pub total_awarded: f64,
    pub total_possible: f64,
    pub grade: Grade,
}

impl GradingResult {
    /// 得分率（百分制），满分为 0 时返回 0
    pub fn percentage(&self) -> f64 {
        if self.total_possible > 0.0 {
            self.total_awarded * 100.0 / self.total_possible
        } else {
            0.0
        }
    }
}

/// 补充评分的执行情况
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GapFillStatus {
    /// 没有缺失题目，或没有评分方案
    NotNeeded,
    /// 有缺失题目但配置关闭了补充评分
    Disabled,
    /// 补充请求成功返回
    Filled { requested: usize, recovered: usize },
    /// 补充请求失败，沿用补充前的结果
    Failed { requested: usize, reason: String },
}

/// 交给持久化 / 渲染协作方的完整报告
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingReport {
    pub result: GradingResult,
    /// 原始叙述，补充评分的回复会原样追加在末尾
    pub narrative: String,
    pub manifest: Option<ExpectedManifest>,
    /// 补充评分后仍缺失的题目
    pub missing: Vec<ManifestEntry>,
    /// 因不在评分方案中而丢弃的题号
    pub phantoms: Vec<String>,
    pub gap_fill: GapFillStatus,
}

impl GradingReport {
    /// 满分与评分方案声明的总分不一致时，返回声明的总分
    pub fn declared_total_mismatch(&self) -> Option<f64> {
        let manifest = self.manifest.as_ref()?;
        if (manifest.declared_total - self.result.total_possible).abs() > 1e-6 {
            Some(manifest.declared_total)
        } else {
            None
        }
    }
}
