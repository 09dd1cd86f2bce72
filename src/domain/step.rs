// ==========================================
// 减停排程系统 - 方案步骤实体
// ==========================================
// 职责: 定义步骤 (Step) 与归一化剂量映射
// 红线: 步骤构造即归一化,同一时段同一药物出现两次时求和
// ==========================================

use crate::domain::types::{SlotDose, StepId, Successor, TimeOfDay};
use std::collections::BTreeMap;

/// 剂量比较容差 (mg)
pub const DOSE_EPSILON: f64 = 1e-6;

// ==========================================
// DoseMap - 归一化剂量映射
// ==========================================

/// 药物 -> 时段 -> 剂量(mg)
///
/// 只保存非零剂量；按药名、时段有序，保证遍历确定性。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoseMap {
    doses: BTreeMap<String, BTreeMap<TimeOfDay, f64>>,
}

impl DoseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由各时段剂量变体归一化
    pub fn from_slots(slots: &BTreeMap<TimeOfDay, SlotDose>) -> Self {
        let mut map = Self::new();
        for (slot, dose) in slots {
            for (medication, mg) in dose.pairs() {
                map.add(medication, *slot, mg);
            }
        }
        map
    }

    /// 累加某药物在某时段的剂量
    pub fn add(&mut self, medication: &str, slot: TimeOfDay, mg: f64) {
        if mg.abs() < DOSE_EPSILON {
            return;
        }
        *self
            .doses
            .entry(medication.to_string())
            .or_default()
            .entry(slot)
            .or_insert(0.0) += mg;
    }

    /// 是否开具该药物（任一时段）
    pub fn prescribes(&self, medication: &str) -> bool {
        self.doses.contains_key(medication)
    }

    /// 某药物在某时段的剂量，未开具为 0
    pub fn dose_at(&self, medication: &str, slot: TimeOfDay) -> f64 {
        self.doses
            .get(medication)
            .and_then(|slots| slots.get(&slot))
            .copied()
            .unwrap_or(0.0)
    }

    /// 某药物的时段剂量表
    pub fn slots_for(&self, medication: &str) -> Option<&BTreeMap<TimeOfDay, f64>> {
        self.doses.get(medication)
    }

    /// 药物名（字母序）
    pub fn medications(&self) -> impl Iterator<Item = &str> {
        self.doses.keys().map(|m| m.as_str())
    }

    /// 某药物需要覆盖的不同剂量（升序去重）
    pub fn distinct_doses(&self, medication: &str) -> Vec<f64> {
        let mut distinct: Vec<f64> = Vec::new();
        if let Some(slots) = self.doses.get(medication) {
            for mg in slots.values() {
                if !distinct.iter().any(|d| (d - mg).abs() < DOSE_EPSILON) {
                    distinct.push(*mg);
                }
            }
        }
        distinct.sort_by(|a, b| a.total_cmp(b));
        distinct
    }

    /// 遍历全部 (药物, 时段, 剂量)
    pub fn iter(&self) -> impl Iterator<Item = (&str, TimeOfDay, f64)> {
        self.doses.iter().flat_map(|(med, slots)| {
            slots.iter().map(move |(slot, mg)| (med.as_str(), *slot, *mg))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.doses.is_empty()
    }
}

// ==========================================
// Step - 方案步骤
// ==========================================

/// 减停方案中的一个阶段：固定时段给药，持续固定周数
#[derive(Debug, Clone)]
pub struct Step {
    pub id: StepId,
    pub weeks: u32,
    pub slots: BTreeMap<TimeOfDay, SlotDose>,
    pub next: Successor,
    doses: DoseMap,
}

impl Step {
    pub fn new(
        id: StepId,
        weeks: u32,
        slots: BTreeMap<TimeOfDay, SlotDose>,
        next: Successor,
    ) -> Self {
        let doses = DoseMap::from_slots(&slots);
        Self {
            id,
            weeks,
            slots,
            next,
            doses,
        }
    }

    /// 归一化后的剂量映射
    pub fn doses(&self) -> &DoseMap {
        &self.doses
    }

    pub fn is_terminal(&self) -> bool {
        self.next.is_end()
    }

    /// 持续天数
    pub fn days(&self) -> i64 {
        i64::from(self.weeks) * 7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(entries: Vec<(TimeOfDay, SlotDose)>) -> BTreeMap<TimeOfDay, SlotDose> {
        entries.into_iter().collect()
    }

    #[test]
    fn test_normalization_flattens_combined_slots() {
        let step = Step::new(
            StepId::from("s1_1"),
            1,
            slots(vec![
                (TimeOfDay::Morning, SlotDose::Single("alprazolam".into(), 2.0)),
                (
                    TimeOfDay::Night,
                    SlotDose::Combined("alprazolam".into(), 1.5, "diazepam".into(), 10.0),
                ),
                (TimeOfDay::Midday, SlotDose::Empty),
            ]),
            Successor::End,
        );

        let doses = step.doses();
        assert_eq!(doses.dose_at("alprazolam", TimeOfDay::Morning), 2.0);
        assert_eq!(doses.dose_at("alprazolam", TimeOfDay::Night), 1.5);
        assert_eq!(doses.dose_at("diazepam", TimeOfDay::Night), 10.0);
        assert_eq!(doses.dose_at("diazepam", TimeOfDay::Midday), 0.0);
        assert_eq!(doses.medications().collect::<Vec<_>>(), vec!["alprazolam", "diazepam"]);
        assert_eq!(doses.distinct_doses("alprazolam"), vec![1.5, 2.0]);
    }

    #[test]
    fn test_same_medication_twice_in_slot_is_summed() {
        let step = Step::new(
            StepId::from("x"),
            2,
            slots(vec![(
                TimeOfDay::Night,
                SlotDose::Combined("diazepam".into(), 5.0, "diazepam".into(), 2.5),
            )]),
            Successor::End,
        );
        assert_eq!(step.doses().dose_at("diazepam", TimeOfDay::Night), 7.5);
        assert_eq!(step.days(), 14);
        assert!(step.is_terminal());
    }

    #[test]
    fn test_empty_step_prescribes_nothing() {
        let step = Step::new(StepId::from("x"), 1, BTreeMap::new(), Successor::End);
        assert!(step.doses().is_empty());
        assert!(!step.doses().prescribes("diazepam"));
        assert!(step.doses().distinct_doses("diazepam").is_empty());
    }
}
