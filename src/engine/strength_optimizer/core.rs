// ==========================================
// 减停排程系统 - 片剂规格优化引擎
// ==========================================
// 职责: 为一个药物在某步骤中的全部剂量选择至多两种规格
// 输入: 药物 + 可用规格 + 需要覆盖的剂量
// 输出: 规格组合 + 每个剂量的整片/半片拆分
// ==========================================
// 偏好 (依次收窄,收窄后为空则跳过该条):
// 1) 每个剂量都至少含一整片 (避免单独半片)
// 2) 剔除多余的第二规格
// 3) 总片数最少 → 规格数最少 → 枚举顺序
// ==========================================

use super::breakdown::{breakdown_dose, Breakdown};
use crate::config::catalog::MedicationCatalog;
use crate::engine::error::{EngineError, EngineResult};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, instrument};

// ==========================================
// StrengthSelection - 优化结果
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrengthSelection {
    pub medication: String,
    /// 选中的规格（目录升序）
    pub strengths: Vec<f64>,
    /// 与输入剂量一一对应
    pub breakdowns: Vec<Breakdown>,
}

impl StrengthSelection {
    /// 某剂量的拆分
    pub fn breakdown_for(&self, dose_mg: f64) -> Option<&Breakdown> {
        self.breakdowns
            .iter()
            .find(|b| super::breakdown::same_strength(b.dose_mg, dose_mg))
    }

    pub fn total_tablets(&self) -> f64 {
        self.breakdowns.iter().map(Breakdown::total_tablets).sum()
    }
}

/// 候选组合
#[derive(Debug, Clone)]
struct Candidate {
    strengths: Vec<f64>,
    breakdowns: Vec<Breakdown>,
    total_tablets: f64,
    /// 枚举顺序
    order: usize,
}

// ==========================================
// StrengthOptimizer - 片剂规格优化引擎
// ==========================================
pub struct StrengthOptimizer {
    // 无状态引擎
}

impl StrengthOptimizer {
    pub fn new() -> Self {
        Self {}
    }

    /// 按目录中的规格优化
    ///
    /// # 返回
    /// - `Err(InvalidInput)`: 药物不在目录中，或剂量非正/非有限
    /// - `Err(Unrepresentable)`: 没有组合能覆盖全部剂量
    pub fn select(
        &self,
        catalog: &MedicationCatalog,
        medication: &str,
        required: &[f64],
    ) -> EngineResult<StrengthSelection> {
        let available = catalog.strengths(medication).ok_or_else(|| {
            EngineError::InvalidInput(format!("unknown medication '{}'", medication))
        })?;
        self.select_from(medication, available, required)
    }

    /// 按给定规格优化（规格顺序即枚举顺序）
    #[instrument(skip(self), level = "debug")]
    pub fn select_from(
        &self,
        medication: &str,
        available: &[f64],
        required: &[f64],
    ) -> EngineResult<StrengthSelection> {
        if let Some(bad) = required.iter().find(|d| !d.is_finite() || **d <= 0.0) {
            return Err(EngineError::InvalidInput(format!(
                "required dose {} of {} must be a positive number",
                bad, medication
            )));
        }
        if required.is_empty() {
            return Ok(StrengthSelection {
                medication: medication.to_string(),
                strengths: Vec::new(),
                breakdowns: Vec::new(),
            });
        }

        let combos = enumerate_combinations(available);
        let mut candidates: Vec<Candidate> = combos
            .into_iter()
            .enumerate()
            .filter_map(|(order, strengths)| evaluate(order, strengths, required))
            .collect();

        if candidates.is_empty() {
            let dose = offending_dose(available, required);
            return Err(EngineError::Unrepresentable {
                medication: medication.to_string(),
                dose,
                strengths: available.to_vec(),
            });
        }

        narrow(&mut candidates, |c| {
            c.breakdowns.iter().all(Breakdown::has_whole_tablet)
        });
        narrow(&mut candidates, |c| !has_spurious_strength(c));

        let best = candidates
            .into_iter()
            .min_by(compare_candidates)
            .ok_or_else(|| EngineError::Unrepresentable {
                medication: medication.to_string(),
                dose: required[0],
                strengths: available.to_vec(),
            })?;

        debug!(
            medication = medication,
            strengths = ?best.strengths,
            total_tablets = best.total_tablets,
            "规格组合选定"
        );

        Ok(StrengthSelection {
            medication: medication.to_string(),
            strengths: best.strengths,
            breakdowns: best.breakdowns,
        })
    }
}

impl Default for StrengthOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 内部算法
// ==========================================

/// 先全部单规格，再全部无序规格对 (i < j)
fn enumerate_combinations(available: &[f64]) -> Vec<Vec<f64>> {
    let mut combos: Vec<Vec<f64>> = available.iter().map(|s| vec![*s]).collect();
    for i in 0..available.len() {
        for j in (i + 1)..available.len() {
            combos.push(vec![available[i], available[j]]);
        }
    }
    combos
}

fn evaluate(order: usize, strengths: Vec<f64>, required: &[f64]) -> Option<Candidate> {
    let breakdowns = required
        .iter()
        .map(|dose| breakdown_dose(*dose, &strengths))
        .collect::<Option<Vec<_>>>()?;
    let total_tablets = breakdowns.iter().map(Breakdown::total_tablets).sum();
    Some(Candidate {
        strengths,
        breakdowns,
        total_tablets,
        order,
    })
}

/// 仅当仍有候选留下时才应用过滤
fn narrow<F>(candidates: &mut Vec<Candidate>, keep: F)
where
    F: Fn(&Candidate) -> bool,
{
    if candidates.iter().any(|c| keep(c)) {
        candidates.retain(|c| keep(c));
    }
}

/// 规格对中仅被一个剂量使用的规格，若另一规格单独能以不多于当前的整片数表达该剂量，即为多余
fn has_spurious_strength(candidate: &Candidate) -> bool {
    if candidate.strengths.len() != 2 {
        return false;
    }

    for (idx, strength) in candidate.strengths.iter().enumerate() {
        let users: Vec<&Breakdown> = candidate
            .breakdowns
            .iter()
            .filter(|b| b.uses(*strength))
            .collect();
        if users.len() != 1 {
            continue;
        }

        let other = candidate.strengths[1 - idx];
        let current = users[0];
        if let Some(alone) = breakdown_dose(current.dose_mg, &[other]) {
            if alone.is_whole_only() && alone.total_tablets() <= current.total_tablets() {
                return true;
            }
        }
    }
    false
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    a.total_tablets
        .total_cmp(&b.total_tablets)
        .then(a.strengths.len().cmp(&b.strengths.len()))
        .then(a.order.cmp(&b.order))
}

/// 报错时指明的剂量：任何组合都无法单独表达的第一个剂量；
/// 若每个剂量都能被某组合表达，则取覆盖最多剂量的组合中第一个失败的剂量
fn offending_dose(available: &[f64], required: &[f64]) -> f64 {
    let combos = enumerate_combinations(available);

    if let Some(dose) = required.iter().find(|dose| {
        combos
            .iter()
            .all(|combo| breakdown_dose(**dose, combo).is_none())
    }) {
        return *dose;
    }

    combos
        .iter()
        .filter_map(|combo| {
            let covered = required
                .iter()
                .filter(|d| breakdown_dose(**d, combo).is_some())
                .count();
            required
                .iter()
                .find(|d| breakdown_dose(**d, combo).is_none())
                .map(|d| (covered, *d))
        })
        .min_by_key(|(covered, _)| std::cmp::Reverse(*covered))
        .map(|(_, dose)| dose)
        .unwrap_or(required[0])
}
