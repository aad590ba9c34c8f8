use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- 解析引擎配置 ---
    /// 是否对缺失题目发起补充请求
    pub gap_fill_enabled: bool,
    /// 题号最大长度，超过即视为误匹配
    pub max_label_chars: usize,
    /// 单题评语最大长度
    pub explanation_max_chars: usize,
    /// 未解析出任何题目时，占位条目截取的原文长度
    pub fallback_excerpt_chars: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.2,
            llm_max_tokens: 4096,
            gap_fill_enabled: true,
            max_label_chars: 50,
            explanation_max_chars: 500,
            fallback_excerpt_chars: 500,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值，随后叠加环境变量
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::Config(ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;

        Ok(config.with_env_overrides())
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env_overrides(self) -> Self {
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.llm_temperature),
            llm_max_tokens: std::env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.llm_max_tokens),
            gap_fill_enabled: std::env::var("GAP_FILL_ENABLED").ok().and_then(|v| v.parse().ok()).unwrap_or(self.gap_fill_enabled),
            max_label_chars: std::env::var("MAX_LABEL_CHARS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_label_chars),
            explanation_max_chars: std::env::var("EXPLANATION_MAX_CHARS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.explanation_max_chars),
            fallback_excerpt_chars: std::env::var("FALLBACK_EXCERPT_CHARS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.fallback_excerpt_chars),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    /// 是否配置了可用的 LLM 服务
    pub fn has_llm_credentials(&self) -> bool {
        !self.llm_api_key.trim().is_empty()
    }
}
