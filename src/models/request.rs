use serde::{Deserialize, Serialize};

/// 一次评分请求的原始输入
///
/// 生成服务据此写出评分叙述；补充评分时原样再发一次，只缩小题目范围。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradingRequest {
    /// 试卷标题
    pub exam_title: String,
    /// 学生作答内容
    pub student_answers: String,
    /// 评分方案原文（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_scheme: Option<String>,
}

impl GradingRequest {
    pub fn new(exam_title: impl Into<String>, student_answers: impl Into<String>) -> Self {
        Self {
            exam_title: exam_title.into(),
            student_answers: student_answers.into(),
            mark_scheme: None,
        }
    }

    pub fn with_mark_scheme(mut self, mark_scheme: impl Into<String>) -> Self {
        self.mark_scheme = Some(mark_scheme.into());
        self
    }
}
