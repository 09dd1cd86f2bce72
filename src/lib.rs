// ==========================================
// 减停排程系统 - 核心库
// ==========================================
// 系统定位: 苯二氮䓬类药物减停排程生成 (处方由医生最终确认)
// 数据流: 患者剂量 → 步骤匹配 → 排程遍历 → 规格优化 → 服药说明
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 方案数据、规格目录、等效剂量表
pub mod config;

// 引擎层 - 排程规则
pub mod engine;

// 日志系统
pub mod logging;

// API 层 - 表单与导出
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{SlotDose, StepId, Successor, TimeOfDay};

// 领域实体
pub use domain::{
    MedicationDoses, PrescriptionLine, ScheduleInterval, Step, TaperPlan, TaperRequest,
};

// 配置
pub use config::{ConfigError, EngineConfig, EquivalenceTable, MedicationCatalog};

// 引擎
pub use engine::{
    EngineError, EngineResult, InstructionBuilder, ProtocolGraph, ScheduleWalker, StepMatcher,
    StrengthOptimizer, TaperEngine,
};

// API
pub use api::{ApiError, TaperApi, TaperForm, TaperResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "减停排程系统";
