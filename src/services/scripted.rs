//! 预置回复的生成服务
//!
//! 不访问网络，按顺序回放预先给定的叙述片段和补充评分回复。
//! 用于离线运行和测试。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::error::{AppError, AppResult, LlmError};
use crate::models::GradingRequest;
use crate::services::generator::{FragmentStream, NarrativeGenerator};

#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    fragments: Vec<String>,
    follow_up: Option<String>,
    follow_up_delay: Option<Duration>,
    follow_up_requests: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedGenerator {
    /// 整份叙述作为单个片段返回
    pub fn with_narrative(narrative: impl Into<String>) -> Self {
        Self::with_fragments(vec![narrative.into()])
    }

    pub fn with_fragments(fragments: Vec<String>) -> Self {
        Self {
            fragments,
            ..Self::default()
        }
    }

    pub fn with_follow_up(mut self, response: impl Into<String>) -> Self {
        self.follow_up = Some(response.into());
        self
    }

    /// 补充评分回复前等待一段时间
    pub fn with_follow_up_delay(mut self, delay: Duration) -> Self {
        self.follow_up_delay = Some(delay);
        self
    }

    /// 已收到的补充评分请求范围
    pub fn follow_up_requests(&self) -> Vec<Vec<String>> {
        match self.follow_up_requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl NarrativeGenerator for ScriptedGenerator {
    async fn stream_narrative(&self, request: &GradingRequest) -> AppResult<FragmentStream> {
        debug!(
            "回放 {} 个叙述片段: {}",
            self.fragments.len(),
            request.exam_title
        );
        let fragments: Vec<AppResult<String>> = self.fragments.iter().cloned().map(Ok).collect();
        Ok(stream::iter(fragments).boxed())
    }

    async fn follow_up(&self, _request: &GradingRequest, scope: &[String]) -> AppResult<String> {
        if let Ok(mut requests) = self.follow_up_requests.lock() {
            requests.push(scope.to_vec());
        }

        if let Some(delay) = self.follow_up_delay {
            tokio::time::sleep(delay).await;
        }

        self.follow_up
            .clone()
            .ok_or_else(|| AppError::Llm(LlmError::NoFollowUp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generator::collect_fragments;

    #[tokio::test]
    async fn test_replays_fragments() {
        let generator =
            ScriptedGenerator::with_fragments(vec!["1 Mark: ".to_string(), "2/2 - ok".to_string()]);
        let stream = generator
            .stream_narrative(&GradingRequest::default())
            .await
            .unwrap();
        let narrative = collect_fragments(stream, |_, _| {}).await.unwrap();
        assert_eq!(narrative, "1 Mark: 2/2 - ok");
    }

    #[tokio::test]
    async fn test_records_follow_up_scope() {
        let generator = ScriptedGenerator::with_narrative("").with_follow_up("1b Mark: 3/3 - ok");
        let scope = vec!["1b(3)".to_string()];

        let response = generator
            .follow_up(&GradingRequest::default(), &scope)
            .await
            .unwrap();

        assert_eq!(response, "1b Mark: 3/3 - ok");
        assert_eq!(generator.follow_up_requests(), vec![scope]);
    }

    #[tokio::test]
    async fn test_missing_follow_up_is_error() {
        let generator = ScriptedGenerator::with_narrative("");
        let err = generator
            .follow_up(&GradingRequest::default(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::NoFollowUp)));
    }
}
