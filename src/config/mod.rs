// ==========================================
// 减停排程系统 - 配置层
// ==========================================
// 职责: 药品目录、等效剂量表、方案图的加载与校验
// 存储: JSON 方案文档（内置或外部文件）
// ==========================================

pub mod catalog;
pub mod engine_config;
pub mod equivalence;
pub mod error;
pub mod protocol_document;

// 重导出核心配置类型
pub use catalog::MedicationCatalog;
pub use engine_config::{default_protocol_path, EngineConfig, PROTOCOL_PATH_ENV};
pub use equivalence::EquivalenceTable;
pub use error::{ConfigError, ConfigResult};
pub use protocol_document::{
    MatchWeightParameters, ProtocolDocument, SlotRecord, StepRecord, END_MARKER,
};
