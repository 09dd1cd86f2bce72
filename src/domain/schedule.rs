// ==========================================
// 减停排程系统 - 排程结果实体
// ==========================================
// 职责: 日历区间 (ScheduleInterval) 与处方行 (PrescriptionLine)
// 生命周期: 每次请求创建,由调用方持有,响应后丢弃
// ==========================================

use crate::domain::types::StepId;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// 说明书与导出统一使用的日期格式
pub const DATE_FORMAT: &str = "%m/%d/%Y";

// ==========================================
// ScheduleInterval - 步骤日历区间
// ==========================================

/// 步骤在日历上的起止日期（闭区间）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInterval {
    pub step_id: StepId,
    pub weeks: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ScheduleInterval {
    /// end_date = start_date + 7×weeks − 1 天
    pub fn starting(step_id: StepId, weeks: u32, start_date: NaiveDate) -> Self {
        let end_date = start_date + Duration::days(i64::from(weeks) * 7 - 1);
        Self {
            step_id,
            weeks,
            start_date,
            end_date,
        }
    }

    /// 区间天数（含首尾）
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// 下一区间的起始日期
    pub fn next_start(&self) -> NaiveDate {
        self.end_date + Duration::days(1)
    }
}

// ==========================================
// PrescriptionLine - 处方行
// ==========================================

/// (步骤, 药物, 规格) 对应的一条处方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionLine {
    pub step: StepId,
    pub medication: String,
    /// 片剂规格 (mg)
    pub strength_mg: f64,
    pub instructions: String,
    /// 整个步骤期间应发片数
    pub quantity: u32,
}

// ==========================================
// TaperPlan - 完整排程
// ==========================================

/// 引擎输出：匹配起点 + 日历区间 + 处方行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaperPlan {
    pub start_step: StepId,
    pub intervals: Vec<ScheduleInterval>,
    pub lines: Vec<PrescriptionLine>,
}

impl TaperPlan {
    /// 最后一个步骤的结束日期
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.intervals.last().map(|i| i.end_date)
    }

    /// 排程总天数
    pub fn total_days(&self) -> i64 {
        self.intervals.iter().map(ScheduleInterval::days).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_end_date() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let interval = ScheduleInterval::starting(StepId::from("s1_1"), 2, start);
        assert_eq!(interval.end_date, NaiveDate::from_ymd_opt(2026, 1, 14).unwrap());
        assert_eq!(interval.days(), 14);
        assert_eq!(interval.next_start(), NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }
}
