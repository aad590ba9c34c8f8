//! LLM 服务 - 业务能力层
//!
//! 只负责"生成评分叙述"能力，不关心解析和流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::models::GradingRequest;
use crate::services::generator::{FragmentStream, NarrativeGenerator};

const GRADING_SYSTEM_MESSAGE: &str = "You are a meticulous exam marker. You apply the mark scheme exactly, \
award marks per sub-question, and always report every sub-question in the requested format.";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成评分叙述（流式）
/// - 对缺失题目发起补充评分
/// - 不解析叙述
/// - 不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 构建聊天请求
    fn build_request(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<CreateChatCompletionRequest> {
        let model = self.model_name.as_str();
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| AppError::llm_request_failed(model, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| AppError::llm_request_failed(model, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| AppError::llm_request_failed(model, e))
    }

    /// 通用的 LLM 调用函数，返回完整回复
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let request = self.build_request(user_message, system_message)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(self.model_name.as_str(), e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AppError::Llm(LlmError::EmptyContent {
                    model: self.model_name.clone(),
                })
            })?;

        Ok(content.trim().to_string())
    }

    /// 流式 LLM 调用，逐段返回增量文本
    pub async fn stream_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<FragmentStream> {
        debug!("调用 LLM 流式 API，模型: {}", self.model_name);

        let request = self.build_request(user_message, system_message)?;
        let stream = self.client.chat().create_stream(request).await.map_err(|e| {
            warn!("LLM 流式 API 调用失败: {}", e);
            AppError::llm_api_failed(self.model_name.as_str(), e)
        })?;

        let model = self.model_name.clone();
        let fragments = stream.enumerate().map(move |(received, chunk)| match chunk {
            Ok(response) => Ok(response
                .choices
                .into_iter()
                .filter_map(|choice| choice.delta.content)
                .collect::<String>()),
            Err(e) => Err(AppError::Llm(LlmError::StreamInterrupted {
                model: model.clone(),
                received,
                source: Box::new(e),
            })),
        });

        Ok(fragments.boxed())
    }

    /// 构建首轮评分提示词
    fn build_grading_prompt(request: &GradingRequest) -> String {
        let mark_scheme = request
            .mark_scheme
            .as_deref()
            .unwrap_or("(no written mark scheme; infer sensible marks per sub-question)");

        format!(
            r#"Grade the following exam answers.

Exam: {}

Mark scheme:
{}

Student answers:
{}

Output rules:
- Report every sub-question on its own line, exactly as:
  <label> Mark: <awarded>/<possible> - <short explanation>
  e.g. "1(a) Mark: 2/3 - Correct method, arithmetic slip."
- Use the question labels from the mark scheme; do not invent questions.
- After the per-question lines you may add "Total:", "Feedback:", "Strengths:" and "Areas for improvement:" sections.
- Finish with a block listing every sub-question and its maximum marks:
[MARK SCHEME SUMMARY]
<label>(<max marks>), <label>(<max marks>), ...
Total: <sum of max marks>
[END SUMMARY]"#,
            request.exam_title, mark_scheme, request.student_answers
        )
    }

    /// 构建补充评分提示词，范围严格限定为 `scope`
    fn build_follow_up_prompt(request: &GradingRequest, scope: &[String]) -> String {
        let mark_scheme = request.mark_scheme.as_deref().unwrap_or("(not provided)");

        format!(
            r#"The previous grading report skipped some sub-questions. Grade ONLY these, nothing else:
{}

Exam: {}

Mark scheme:
{}

Student answers:
{}

Report each listed sub-question on its own line, exactly as:
<label> Mark: <awarded>/<possible> - <short explanation>
Do not repeat any other question, totals, or a summary block."#,
            scope.join(", "),
            request.exam_title,
            mark_scheme,
            request.student_answers
        )
    }
}

#[async_trait]
impl NarrativeGenerator for LlmService {
    async fn stream_narrative(&self, request: &GradingRequest) -> AppResult<FragmentStream> {
        let prompt = Self::build_grading_prompt(request);
        self.stream_to_llm(&prompt, Some(GRADING_SYSTEM_MESSAGE)).await
    }

    async fn follow_up(&self, request: &GradingRequest, scope: &[String]) -> AppResult<String> {
        let prompt = Self::build_follow_up_prompt(request, scope);
        self.send_to_llm(&prompt, Some(GRADING_SYSTEM_MESSAGE)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generator::collect_fragments;

    fn create_test_request() -> GradingRequest {
        GradingRequest::new("Physics Mock 3", "1a: F = ma\n1b: 12 N")
            .with_mark_scheme("1a(2), 1b(3), 2a(5)")
    }

    #[test]
    fn test_grading_prompt_describes_format() {
        let prompt = LlmService::build_grading_prompt(&create_test_request());

        assert!(prompt.contains("Physics Mock 3"));
        assert!(prompt.contains("<label> Mark: <awarded>/<possible>"));
        assert!(prompt.contains("[MARK SCHEME SUMMARY]"));
        assert!(prompt.contains("[END SUMMARY]"));
    }

    #[test]
    fn test_follow_up_prompt_is_scoped() {
        let scope = vec!["1b(3)".to_string(), "2a(5)".to_string()];
        let prompt = LlmService::build_follow_up_prompt(&create_test_request(), &scope);

        assert!(prompt.contains("1b(3), 2a(5)"));
        assert!(prompt.contains("Grade ONLY these"));
        assert!(!prompt.contains("[MARK SCHEME SUMMARY]"));
    }

    #[test]
    fn test_prompt_without_mark_scheme() {
        let request = GradingRequest::new("Quiz", "answers");
        let prompt = LlmService::build_grading_prompt(&request);
        assert!(prompt.contains("no written mark scheme"));
    }

    /// 测试真实 LLM 流式评分
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_stream_narrative_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_stream_narrative_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = LlmService::new(&Config::from_env());
        let stream = service
            .stream_narrative(&create_test_request())
            .await
            .expect("流式调用失败");
        let narrative = collect_fragments(stream, |_, _| {}).await.expect("读取流失败");

        println!("\n========== LLM 评分叙述 ==========\n{}\n", narrative);
        assert!(narrative.contains("Mark"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_follow_up_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = LlmService::new(&Config::from_env());
        let response = service
            .follow_up(&create_test_request(), &["1b(3)".to_string()])
            .await
            .expect("补充评分调用失败");

        println!("\n========== 补充评分 ==========\n{}\n", response);
        assert!(response.contains("1b"));
    }
}
