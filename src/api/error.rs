// ==========================================
// 减停排程系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,将引擎/配置错误转换为表单可展示的消息
// ==========================================

use crate::config::error::ConfigError;
use crate::engine::error::EngineError;
use thiserror::Error;

/// 表单日期格式错误时展示的消息
pub const INVALID_DATE_MESSAGE: &str = "Invalid date. Please use M/D/YYYY format.";
/// 没有匹配步骤时展示的消息
pub const NO_MATCH_MESSAGE: &str = "No matching taper step found for those doses.";

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 表单输入错误
    // ==========================================
    #[error("无效日期: '{0}'")]
    InvalidDate(String),

    #[error("无效数值: field={field}, value='{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("缺少必填字段: {0}")]
    MissingField(String),

    // ==========================================
    // 下层错误
    // ==========================================
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("导出失败: {0}")]
    Export(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 机器可读的错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidDate(_) => "INVALID_DATE",
            ApiError::InvalidNumber { .. } => "INVALID_NUMBER",
            ApiError::MissingField(_) => "MISSING_FIELD",
            ApiError::Engine(e) => e.code(),
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Export(_) => "EXPORT_ERROR",
            ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// 展示给表单使用者的消息
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidDate(_) => INVALID_DATE_MESSAGE.to_string(),
            ApiError::InvalidNumber { field, value } => {
                format!("Invalid number '{}' for {}.", value, field)
            }
            ApiError::MissingField(field) => format!("Please provide {}.", field),
            ApiError::Engine(EngineError::NotFound(_)) => NO_MATCH_MESSAGE.to_string(),
            ApiError::Engine(EngineError::InvalidInput(msg)) => format!("Invalid input: {}.", msg),
            ApiError::Engine(e @ EngineError::Unrepresentable { .. }) => {
                format!("Unable to build tablet instructions: {}.", e)
            }
            ApiError::Engine(EngineError::MalformedGraph(msg)) => {
                format!("The taper protocol is malformed: {}.", msg)
            }
            ApiError::Config(e) => format!("The taper protocol could not be loaded: {}.", e),
            ApiError::Export(msg) => format!("Export failed: {}.", msg),
            ApiError::Other(e) => format!("Unexpected error: {}.", e),
        }
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::Export(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Export(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
