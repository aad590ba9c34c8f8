use crate::error::{AppError, AppResult, ConfigError};
use crate::models::request::GradingRequest;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载评分请求
pub async fn load_grading_request(toml_file_path: &Path) -> AppResult<GradingRequest> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    let request: GradingRequest = toml::from_str(&content).map_err(|e| {
        AppError::Config(ConfigError::TomlParseFailed {
            path: toml_file_path.display().to_string(),
            source: Box::new(e),
        })
    })?;

    tracing::info!(
        "成功加载评分请求: {} (作答 {} 字符)",
        request.exam_title,
        request.student_answers.chars().count()
    );

    Ok(request)
}
