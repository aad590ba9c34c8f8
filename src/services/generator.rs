//! 文本生成服务边界
//!
//! 引擎把生成服务当作无状态的请求 / 流式响应依赖：
//! - `stream_narrative`：生成整份评分叙述，按片段返回
//! - `follow_up`：只针对给定的 `label(maxMarks)` 列表补充评分

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};

use crate::error::AppResult;
use crate::models::GradingRequest;

/// 叙述片段流
pub type FragmentStream = BoxStream<'static, AppResult<String>>;

/// 文本生成服务
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// 生成评分叙述，片段按顺序拼接即为完整文本
    async fn stream_narrative(&self, request: &GradingRequest) -> AppResult<FragmentStream>;

    /// 对缺失题目补充评分
    ///
    /// `scope` 中每一项形如 `1b(3)`；回复沿用 `<label> Mark: X/Y - 解释` 的写法。
    async fn follow_up(&self, request: &GradingRequest, scope: &[String]) -> AppResult<String>;
}

/// 按顺序拼接片段流，每收到一段回调一次 `on_fragment(序号, 片段)`
pub async fn collect_fragments<F>(mut stream: FragmentStream, mut on_fragment: F) -> AppResult<String>
where
    F: FnMut(usize, &str),
{
    let mut narrative = String::new();
    let mut count = 0;
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        count += 1;
        on_fragment(count, &fragment);
        narrative.push_str(&fragment);
    }
    Ok(narrative)
}
