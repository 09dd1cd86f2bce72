// ==========================================
// 减停排程系统 - 领域类型定义
// ==========================================
// 职责: 时段、步骤标识、后继引用、时段剂量变体
// 红线: 时段剂量形态在加载时即归一化,下游不再判断形态
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 服药时段 (Time of Day)
// ==========================================
// 顺序: Morning < Midday < Afternoon < Night (即说明书渲染顺序)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Midday,
    Afternoon, // 患者录入有此项,内置方案数据从不使用
    Night,
}

impl TimeOfDay {
    /// 全部时段（按渲染顺序）
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Midday,
        TimeOfDay::Afternoon,
        TimeOfDay::Night,
    ];

    /// 说明书中使用的介词短语
    pub fn preposition(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "in the Morning",
            TimeOfDay::Midday => "at Midday",
            TimeOfDay::Afternoon => "in the Afternoon",
            TimeOfDay::Night => "at Night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOfDay::Morning => write!(f, "Morning"),
            TimeOfDay::Midday => write!(f, "Midday"),
            TimeOfDay::Afternoon => write!(f, "Afternoon"),
            TimeOfDay::Night => write!(f, "Night"),
        }
    }
}

// ==========================================
// 步骤标识 (Step Id)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ==========================================
// 后继引用 (Successor)
// ==========================================
// 终止标记表示患者已完全停药
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Successor {
    Next(StepId),
    End,
}

impl Successor {
    pub fn is_end(&self) -> bool {
        matches!(self, Successor::End)
    }

    pub fn step_id(&self) -> Option<&StepId> {
        match self {
            Successor::Next(id) => Some(id),
            Successor::End => None,
        }
    }
}

impl fmt::Display for Successor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Successor::Next(id) => write!(f, "{}", id),
            Successor::End => write!(f, "END"),
        }
    }
}

// ==========================================
// 时段剂量 (Slot Dose)
// ==========================================
// 单个时段: 不给药 / 单药 / 两药合用
#[derive(Debug, Clone, PartialEq)]
pub enum SlotDose {
    Empty,
    Single(String, f64),
    Combined(String, f64, String, f64),
}

impl SlotDose {
    /// 展开为 (药名, 剂量mg) 序列
    pub fn pairs(&self) -> Vec<(&str, f64)> {
        match self {
            SlotDose::Empty => Vec::new(),
            SlotDose::Single(med, mg) => vec![(med.as_str(), *mg)],
            SlotDose::Combined(med_a, mg_a, med_b, mg_b) => {
                vec![(med_a.as_str(), *mg_a), (med_b.as_str(), *mg_b)]
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SlotDose::Empty)
    }
}
