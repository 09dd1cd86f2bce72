// ==========================================
// 减停排程系统 - 步骤匹配引擎
// ==========================================
// 职责: 按患者当前剂量为每个步骤评分,选出最匹配的入口
// 输入: 方案图 + 等效剂量表 + 患者主药/替代药剂量
// 输出: 排程起始步骤 (最匹配步骤的后继)
// ==========================================
// 评分: 药物类别加分 + 时段剂量匹配 − 等效剂量差惩罚
// 平局: 评估顺序中先出现者胜出
// ==========================================

use crate::config::equivalence::EquivalenceTable;
use crate::domain::patient::MedicationDoses;
use crate::domain::step::{Step, DOSE_EPSILON};
use crate::domain::types::{StepId, Successor, TimeOfDay};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::protocol_graph::ProtocolGraph;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

// ==========================================
// MatchWeights - 评分权重
// ==========================================

/// 评分权重
///
/// score = medication_match × 类别命中数
///       + dose_match × 剂量分
///       − equivalence_penalty × |步骤等效总量 − 患者等效总量|
///
/// 剂量分：时段剂量一致 +1；步骤剂量高于患者 −dose_mismatch；
/// 步骤完全不含所报药物 −dose_mismatch。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub medication_match: f64,
    pub dose_match: f64,
    pub dose_mismatch: f64,
    pub equivalence_penalty: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            medication_match: 10.0,
            dose_match: 5.0,
            dose_mismatch: 2.0,
            equivalence_penalty: 1.0,
        }
    }
}

// ==========================================
// MatchScore - 评分明细（可解释性）
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScore {
    /// 步骤含有的所报药物个数
    pub medication_hits: u32,
    /// 时段剂量分
    pub dose_score: f64,
    /// 步骤等效总量
    pub step_equivalent: f64,
    /// 等效差惩罚（差值未超过容差时为 0）
    pub equivalence_gap: f64,
    pub total: f64,
}

// ==========================================
// StepMatch - 匹配结果
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepMatch {
    /// 与患者当前状态最匹配的步骤
    pub matched: StepId,
    /// 排程起点（matched 的后继；matched 为终点时即其本身）
    pub start: StepId,
    pub score: MatchScore,
}

// ==========================================
// StepMatcher - 步骤匹配引擎
// ==========================================
pub struct StepMatcher {
    weights: MatchWeights,
}

impl StepMatcher {
    pub fn new(weights: MatchWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    /// 查找排程起始步骤
    ///
    /// # 参数
    /// - `graph`: 方案图
    /// - `equivalence`: 等效剂量表
    /// - `primary`: 主药剂量
    /// - `secondary`: 替代药剂量（可选）
    ///
    /// # 返回
    /// - `Ok(StepMatch)`: 最匹配步骤及排程起点
    /// - `Err(NotFound)`: 方案图为空/无根，或没有步骤得分高于 −∞
    #[instrument(skip_all, fields(primary = %primary.medication))]
    pub fn find_match(
        &self,
        graph: &ProtocolGraph,
        equivalence: &EquivalenceTable,
        primary: &MedicationDoses,
        secondary: Option<&MedicationDoses>,
    ) -> EngineResult<StepMatch> {
        if graph.is_empty() {
            return Err(EngineError::NotFound("protocol graph is empty".to_string()));
        }

        let order = graph.evaluation_order();
        if order.is_empty() {
            return Err(EngineError::NotFound(
                "protocol graph has no root steps".to_string(),
            ));
        }

        let reported: Vec<&MedicationDoses> =
            std::iter::once(primary).chain(secondary).collect();
        let patient_equivalent = self.patient_equivalent(equivalence, &reported);

        let mut best: Option<(&Step, MatchScore)> = None;
        for step in order {
            let score = self.score_step(step, equivalence, &reported, patient_equivalent);
            // 严格大于：平局保留先出现者
            let improves = match &best {
                None => score.total > f64::NEG_INFINITY,
                Some((_, current)) => score.total > current.total,
            };
            if improves {
                best = Some((step, score));
            }
        }

        let (step, score) = best.ok_or_else(|| {
            EngineError::NotFound("no protocol step matches the reported doses".to_string())
        })?;

        let start = match &step.next {
            Successor::Next(next) => next.clone(),
            Successor::End => step.id.clone(),
        };

        info!(
            matched = %step.id,
            start = %start,
            score = score.total,
            patient_equivalent = patient_equivalent,
            "步骤匹配完成"
        );

        Ok(StepMatch {
            matched: step.id.clone(),
            start,
            score,
        })
    }

    /// 患者等效总量（全部所报药物、全部时段）
    pub fn patient_equivalent(
        &self,
        equivalence: &EquivalenceTable,
        reported: &[&MedicationDoses],
    ) -> f64 {
        reported
            .iter()
            .map(|doses| {
                TimeOfDay::ALL
                    .iter()
                    .map(|slot| equivalence.equivalent(&doses.medication, doses.dose_at(*slot)))
                    .sum::<f64>()
            })
            .sum()
    }

    /// 单个步骤评分
    pub fn score_step(
        &self,
        step: &Step,
        equivalence: &EquivalenceTable,
        reported: &[&MedicationDoses],
        patient_equivalent: f64,
    ) -> MatchScore {
        let doses = step.doses();
        let mut medication_hits = 0u32;
        let mut dose_score = 0.0;

        for patient in reported {
            if !doses.prescribes(&patient.medication) {
                dose_score -= self.weights.dose_mismatch;
                continue;
            }
            medication_hits += 1;

            for slot in TimeOfDay::ALL {
                let scheduled = doses.dose_at(&patient.medication, slot);
                let reported_mg = patient.dose_at(slot);
                if (scheduled - reported_mg).abs() < DOSE_EPSILON {
                    dose_score += 1.0;
                } else if scheduled > reported_mg {
                    dose_score -= self.weights.dose_mismatch;
                }
            }
        }

        let step_equivalent: f64 = doses
            .iter()
            .map(|(medication, _, mg)| equivalence.equivalent(medication, mg))
            .sum();
        let diff = (step_equivalent - patient_equivalent).abs();
        let equivalence_gap = if diff > DOSE_EPSILON { diff } else { 0.0 };

        let total = self.weights.medication_match * f64::from(medication_hits)
            + self.weights.dose_match * dose_score
            - self.weights.equivalence_penalty * equivalence_gap;

        debug!(
            step = %step.id,
            medication_hits,
            dose_score,
            step_equivalent,
            total,
            "步骤评分"
        );

        MatchScore {
            medication_hits,
            dose_score,
            step_equivalent,
            equivalence_gap,
            total,
        }
    }
}

impl Default for StepMatcher {
    fn default() -> Self {
        Self::new(MatchWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SlotDose;
    use std::collections::BTreeMap;

    fn step(id: &str, doses: &[(TimeOfDay, &str, f64)], next: Option<&str>) -> Step {
        let mut slots = BTreeMap::new();
        for (slot, med, mg) in doses {
            slots.insert(*slot, SlotDose::Single(med.to_string(), *mg));
        }
        Step::new(
            StepId::from(id),
            1,
            slots,
            next.map(|n| Successor::Next(StepId::from(n)))
                .unwrap_or(Successor::End),
        )
    }

    fn equivalence() -> EquivalenceTable {
        let mut table = EquivalenceTable::new();
        table.insert("alprazolam", 20.0).unwrap();
        table.insert("diazepam", 1.0).unwrap();
        table
    }

    fn three_step_graph() -> ProtocolGraph {
        use TimeOfDay::*;
        ProtocolGraph::build(
            vec![
                step(
                    "a_0",
                    &[(Morning, "alprazolam", 1.0), (Night, "alprazolam", 1.0)],
                    Some("a_1"),
                ),
                step("a_1", &[(Night, "alprazolam", 1.0)], Some("a_2")),
                step("a_2", &[(Night, "diazepam", 5.0)], None),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_exact_match_returns_successor() {
        let graph = three_step_graph();
        let patient = MedicationDoses::new("alprazolam")
            .with(TimeOfDay::Morning, 1.0)
            .with(TimeOfDay::Night, 1.0);

        let result = StepMatcher::default()
            .find_match(&graph, &equivalence(), &patient, None)
            .unwrap();
        assert_eq!(result.matched.as_str(), "a_0");
        assert_eq!(result.start.as_str(), "a_1");
        assert_eq!(result.score.equivalence_gap, 0.0);
    }

    #[test]
    fn test_terminal_match_returns_itself() {
        let graph = three_step_graph();
        let patient = MedicationDoses::new("diazepam").with(TimeOfDay::Night, 5.0);

        let result = StepMatcher::default()
            .find_match(&graph, &equivalence(), &patient, None)
            .unwrap();
        assert_eq!(result.matched.as_str(), "a_2");
        assert_eq!(result.start.as_str(), "a_2");
    }

    #[test]
    fn test_over_dosing_step_is_penalized() {
        let graph = three_step_graph();
        let matcher = StepMatcher::default();
        let table = equivalence();
        // 患者只在晚间服用 1mg
        let patient = MedicationDoses::new("alprazolam").with(TimeOfDay::Night, 1.0);
        let reported = [&patient];
        let patient_eq = matcher.patient_equivalent(&table, &reported);

        let a0 = matcher.score_step(graph.get(&"a_0".into()).unwrap(), &table, &reported, patient_eq);
        let a1 = matcher.score_step(graph.get(&"a_1".into()).unwrap(), &table, &reported, patient_eq);
        assert!(a1.total > a0.total);
        // a_0 早晨 1mg > 患者 0mg → −2；其余三个时段一致 → +3
        assert_eq!(a0.dose_score, 1.0);
        assert_eq!(a0.equivalence_gap, 20.0);
    }

    #[test]
    fn test_absent_medication_is_penalized() {
        let graph = three_step_graph();
        let matcher = StepMatcher::default();
        let table = equivalence();
        let patient = MedicationDoses::new("alprazolam").with(TimeOfDay::Night, 1.0);
        let reported = [&patient];

        let a2 = matcher.score_step(graph.get(&"a_2".into()).unwrap(), &table, &reported, 20.0);
        assert_eq!(a2.medication_hits, 0);
        assert_eq!(a2.dose_score, -2.0);
        // 5×(−2) − |5 − 20|
        assert_eq!(a2.total, -25.0);
    }

    #[test]
    fn test_ties_keep_first_in_evaluation_order() {
        use TimeOfDay::*;
        let graph = ProtocolGraph::build(
            vec![
                step("x_0", &[(Night, "diazepam", 5.0)], Some("x_1")),
                step("x_1", &[(Night, "diazepam", 2.0)], None),
                step("y_0", &[(Night, "diazepam", 5.0)], Some("x_1")),
            ],
            None,
        )
        .unwrap();
        let patient = MedicationDoses::new("diazepam").with(Night, 5.0);
        let result = StepMatcher::default()
            .find_match(&graph, &equivalence(), &patient, None)
            .unwrap();
        assert_eq!(result.matched.as_str(), "x_0");
    }

    #[test]
    fn test_empty_graph_is_not_found() {
        let graph = ProtocolGraph::build(Vec::new(), None).unwrap();
        let patient = MedicationDoses::new("diazepam");
        let err = StepMatcher::default()
            .find_match(&graph, &equivalence(), &patient, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_graph_without_roots_is_not_found() {
        let graph = ProtocolGraph::build(
            vec![step("a", &[(TimeOfDay::Night, "diazepam", 5.0)], None)],
            Some(Vec::new()),
        )
        .unwrap();
        let patient = MedicationDoses::new("diazepam");
        let err = StepMatcher::default()
            .find_match(&graph, &equivalence(), &patient, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_secondary_medication_contributes_to_score() {
        use TimeOfDay::*;
        let mut slots = BTreeMap::new();
        slots.insert(
            Night,
            SlotDose::Combined("alprazolam".into(), 1.0, "diazepam".into(), 10.0),
        );
        let combined = Step::new(StepId::from("c_0"), 1, slots, Successor::End);
        let alone = step("d_0", &[(Night, "alprazolam", 1.0)], None);
        let graph = ProtocolGraph::build(vec![alone, combined], None).unwrap();

        let primary = MedicationDoses::new("alprazolam").with(Night, 1.0);
        let secondary = MedicationDoses::new("diazepam").with(Night, 10.0);
        let result = StepMatcher::default()
            .find_match(&graph, &equivalence(), &primary, Some(&secondary))
            .unwrap();
        assert_eq!(result.matched.as_str(), "c_0");
        assert_eq!(result.score.medication_hits, 2);
    }
}
