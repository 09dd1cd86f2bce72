use crate::domain::types::{SlotDose, StepId, Successor, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 方案数据中表示"方案结束"的后继值
pub const END_MARKER: &str = "END";

/// 方案文档（JSON 持久化对象）
///
/// 内置数据：data/taper_protocol.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolDocument {
    /// 药物 -> 片剂规格 (mg)
    pub catalog: BTreeMap<String, Vec<f64>>,

    /// 药物 -> 地西泮等效系数
    #[serde(default)]
    pub equivalence: BTreeMap<String, f64>,

    /// 根步骤（评估顺序）；缺省时取无前驱步骤
    #[serde(default)]
    pub roots: Option<Vec<String>>,

    pub steps: Vec<StepRecord>,

    /// 匹配评分权重微调（可选）
    #[serde(default)]
    pub match_weights: MatchWeightParameters,
}

/// 单个步骤记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: String,
    pub weeks: u32,
    #[serde(default)]
    pub doses: BTreeMap<TimeOfDay, Option<SlotRecord>>,
    pub next: String,
}

/// 时段内容的原始形态
///
/// - `false` / `null` / 缺省: 不给药
/// - `["alprazolam", 2]`: 单药
/// - `[["alprazolam", 1.5], ["diazepam", 10]]`: 两药合用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotRecord {
    Flag(bool),
    Single(String, f64),
    Combined((String, f64), (String, f64)),
}

impl SlotRecord {
    /// 转换为领域变体；`true` 不是合法的时段内容
    pub fn into_slot_dose(self) -> Option<SlotDose> {
        match self {
            SlotRecord::Flag(false) => Some(SlotDose::Empty),
            SlotRecord::Flag(true) => None,
            SlotRecord::Single(med, mg) => Some(SlotDose::Single(med, mg)),
            SlotRecord::Combined((med_a, mg_a), (med_b, mg_b)) => {
                Some(SlotDose::Combined(med_a, mg_a, med_b, mg_b))
            }
        }
    }
}

impl StepRecord {
    pub fn step_id(&self) -> StepId {
        StepId::new(self.id.trim())
    }

    pub fn successor(&self) -> Successor {
        let next = self.next.trim();
        if next.eq_ignore_ascii_case(END_MARKER) {
            Successor::End
        } else {
            Successor::Next(StepId::new(next))
        }
    }
}

/// 匹配评分权重参数（未填写的项沿用默认值）
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MatchWeightParameters {
    /// 步骤含有患者所报药物时的加分
    #[serde(default)]
    pub medication_match: Option<f64>,

    /// 时段剂量一致/不一致项的乘数
    #[serde(default)]
    pub dose_match: Option<f64>,

    /// 时段剂量高于患者剂量（或缺少该药物）的扣分单位
    #[serde(default)]
    pub dose_mismatch: Option<f64>,

    /// 等效剂量差的惩罚系数
    #[serde(default)]
    pub equivalence_penalty: Option<f64>,
}
