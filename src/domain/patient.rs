// ==========================================
// 减停排程系统 - 患者输入
// ==========================================
// 职责: 患者当前用药 (主药 + 可选替代药) 与起始日期
// ==========================================

use crate::domain::types::TimeOfDay;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// MedicationDoses - 单一药物的时段剂量
// ==========================================

/// 患者报告的某药物各时段剂量 (mg)
///
/// 未填写的时段视为 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationDoses {
    pub medication: String,
    pub doses: BTreeMap<TimeOfDay, f64>,
}

impl MedicationDoses {
    pub fn new(medication: impl Into<String>) -> Self {
        Self {
            medication: medication.into(),
            doses: TimeOfDay::ALL.iter().map(|slot| (*slot, 0.0)).collect(),
        }
    }

    /// 设置某时段剂量（链式）
    pub fn with(mut self, slot: TimeOfDay, mg: f64) -> Self {
        self.doses.insert(slot, mg);
        self
    }

    /// 由四个时段剂量构造（早/午/下午/晚）
    pub fn from_slots(
        medication: impl Into<String>,
        morning: f64,
        midday: f64,
        afternoon: f64,
        night: f64,
    ) -> Self {
        Self::new(medication)
            .with(TimeOfDay::Morning, morning)
            .with(TimeOfDay::Midday, midday)
            .with(TimeOfDay::Afternoon, afternoon)
            .with(TimeOfDay::Night, night)
    }

    pub fn dose_at(&self, slot: TimeOfDay) -> f64 {
        self.doses.get(&slot).copied().unwrap_or(0.0)
    }

    /// 全部时段剂量之和 (mg)
    pub fn total_mg(&self) -> f64 {
        self.doses.values().sum()
    }
}

// ==========================================
// TaperRequest - 排程请求
// ==========================================

/// 引擎入口参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaperRequest {
    /// 主药
    pub primary: MedicationDoses,
    /// 替代药（通常为长效的地西泮）
    pub secondary: Option<MedicationDoses>,
    /// 排程起始日期
    pub start_date: NaiveDate,
}

impl TaperRequest {
    pub fn new(primary: MedicationDoses, start_date: NaiveDate) -> Self {
        Self {
            primary,
            secondary: None,
            start_date,
        }
    }

    pub fn with_secondary(mut self, secondary: MedicationDoses) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// 报告的全部药物（主药在前）
    pub fn reported(&self) -> impl Iterator<Item = &MedicationDoses> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }
}
