// ==========================================
// 减停排程系统 - 引擎层
// ==========================================
// 职责: 步骤匹配 / 排程遍历 / 规格优化 / 服药说明
// 红线: 引擎为纯函数,只读共享配置,不做 I/O
// ==========================================

pub mod error;
pub mod instruction_builder;
pub mod orchestrator;
pub mod protocol_graph;
pub mod schedule_walker;
pub mod step_matcher;
pub mod strength_optimizer;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use instruction_builder::InstructionBuilder;
pub use orchestrator::TaperEngine;
pub use protocol_graph::ProtocolGraph;
pub use schedule_walker::ScheduleWalker;
pub use step_matcher::{MatchScore, MatchWeights, StepMatch, StepMatcher};
pub use strength_optimizer::{breakdown_dose, Breakdown, StrengthOptimizer, StrengthSelection};
