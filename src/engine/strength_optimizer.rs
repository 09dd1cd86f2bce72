// ==========================================
// 减停排程系统 - 片剂规格优化引擎
// ==========================================
// 职责: 将毫克剂量转换为具体规格与整片/半片数
// 红线: 只允许整片与半片
// ==========================================

mod breakdown;
mod core;


pub use self::breakdown::{breakdown_dose, Breakdown, TabletCount};
pub use self::core::{StrengthOptimizer, StrengthSelection};
