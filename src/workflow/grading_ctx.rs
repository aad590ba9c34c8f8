//! 评分处理上下文
//!
//! 封装"我正在处理哪一份评分请求"这一信息

use std::fmt::Display;

use crate::models::GradingRequest;

/// 评分处理上下文
#[derive(Debug, Clone)]
pub struct GradingCtx {
    /// 请求编号（仅用于日志显示）
    pub request_id: usize,

    /// 评分请求，补充评分时原样复用
    pub request: GradingRequest,
}

impl GradingCtx {
    pub fn new(request_id: usize, request: GradingRequest) -> Self {
        Self {
            request_id,
            request,
        }
    }
}

impl Display for GradingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[评分 #{} 《{}》]",
            self.request_id, self.request.exam_title
        )
    }
}
