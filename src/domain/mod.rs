// ==========================================
// 减停排程系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含配置加载逻辑,不含引擎逻辑
// ==========================================

pub mod patient;
pub mod schedule;
pub mod step;
pub mod types;

// 重导出核心类型
pub use patient::{MedicationDoses, TaperRequest};
pub use schedule::{PrescriptionLine, ScheduleInterval, TaperPlan, DATE_FORMAT};
pub use step::{DoseMap, Step, DOSE_EPSILON};
pub use types::{SlotDose, StepId, Successor, TimeOfDay};
