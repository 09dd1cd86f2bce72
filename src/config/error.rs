// ==========================================
// 减停排程系统 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== 文件相关错误 =====
    #[error("failed to read protocol file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse protocol document: {0}")]
    Parse(#[from] serde_json::Error),

    // ===== 数据校验错误 =====
    #[error("invalid tablet strengths for {medication}: {message}")]
    InvalidCatalog { medication: String, message: String },

    #[error("invalid equivalence factor for {medication}: {factor}")]
    InvalidEquivalence { medication: String, factor: f64 },

    #[error("invalid step '{step_id}': {message}")]
    InvalidStep { step_id: String, message: String },

    #[error("step '{step_id}' prescribes {medication}, which has no catalog entry")]
    UnknownMedication { step_id: String, medication: String },

    #[error("invalid match weights: {0}")]
    InvalidWeights(String),

    // ===== 方案图错误 =====
    #[error(transparent)]
    Graph(#[from] EngineError),
}

/// 配置层 Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
