use super::wording::{instruction_sentence, slot_phrase};
use crate::config::catalog::MedicationCatalog;
use crate::domain::schedule::{PrescriptionLine, ScheduleInterval};
use crate::domain::step::{Step, DOSE_EPSILON};
use crate::domain::types::TimeOfDay;
use crate::engine::error::EngineResult;
use crate::engine::protocol_graph::ProtocolGraph;
use crate::engine::strength_optimizer::{StrengthOptimizer, StrengthSelection};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// ==========================================
// InstructionBuilder - 服药说明生成引擎
// ==========================================
pub struct InstructionBuilder {
    optimizer: StrengthOptimizer,
}

impl InstructionBuilder {
    pub fn new() -> Self {
        Self {
            optimizer: StrengthOptimizer::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 为整条排程生成处方行（按区间顺序）
    pub fn build_all(
        &self,
        catalog: &MedicationCatalog,
        graph: &ProtocolGraph,
        intervals: &[ScheduleInterval],
    ) -> EngineResult<Vec<PrescriptionLine>> {
        let mut lines = Vec::new();
        for interval in intervals {
            let step = graph.step(&interval.step_id)?;
            lines.extend(self.build_step(catalog, step, interval)?);
        }
        Ok(lines)
    }

    /// 为单个步骤生成处方行
    ///
    /// # 返回
    /// - 药物按字母序，同一药物按所选规格升序
    /// - 在所有时段都为 0 片的规格不出现
    /// - `Err(InvalidInput | Unrepresentable)`: 来自规格优化
    #[instrument(skip_all, fields(step = %step.id), level = "debug")]
    pub fn build_step(
        &self,
        catalog: &MedicationCatalog,
        step: &Step,
        interval: &ScheduleInterval,
    ) -> EngineResult<Vec<PrescriptionLine>> {
        let doses = step.doses();
        let mut lines = Vec::new();

        for medication in doses.medications() {
            let Some(slots) = doses.slots_for(medication) else {
                continue;
            };
            let required = doses.distinct_doses(medication);
            if required.is_empty() {
                continue;
            }

            let selection = self.optimizer.select(catalog, medication, &required)?;
            for strength in &selection.strengths {
                let totals = slot_totals(&selection, slots, *strength);
                if totals.is_empty() {
                    continue;
                }
                lines.push(render_line(step, interval, medication, *strength, &totals));
            }
        }

        debug!(lines = lines.len(), "步骤处方行生成完成");
        Ok(lines)
    }
}

impl Default for InstructionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 内部渲染
// ==========================================

/// 每个时段该规格的片数，0 片的时段不计入
fn slot_totals(
    selection: &StrengthSelection,
    slots: &BTreeMap<TimeOfDay, f64>,
    strength_mg: f64,
) -> BTreeMap<TimeOfDay, f64> {
    let mut totals = BTreeMap::new();
    for (slot, mg) in slots {
        let count = selection
            .breakdown_for(*mg)
            .map(|b| b.count_for(strength_mg))
            .unwrap_or(0.0);
        if count > 0.0 {
            *totals.entry(*slot).or_insert(0.0) += count;
        }
    }
    totals
}

fn render_line(
    step: &Step,
    interval: &ScheduleInterval,
    medication: &str,
    strength_mg: f64,
    totals: &BTreeMap<TimeOfDay, f64>,
) -> PrescriptionLine {
    // BTreeMap 按 TimeOfDay 顺序迭代，即 Morning → Midday → Afternoon → Night
    let phrases: Vec<String> = totals
        .iter()
        .map(|(slot, count)| slot_phrase(*count, strength_mg, medication, *slot))
        .collect();

    let daily: f64 = totals.values().sum();
    let quantity = (daily * f64::from(interval.weeks) * 7.0 - DOSE_EPSILON).ceil() as u32;

    PrescriptionLine {
        step: step.id.clone(),
        medication: medication.to_string(),
        strength_mg,
        instructions: instruction_sentence(&phrases, interval),
        quantity,
    }
}
