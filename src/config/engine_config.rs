// ==========================================
// 减停排程系统 - 引擎配置
// ==========================================
// 职责: 加载药品目录、等效剂量表、方案图,一次构造后只读
// 来源: 内置 JSON / 外部文件 / 调用方直接构造
// ==========================================

use crate::config::catalog::MedicationCatalog;
use crate::config::equivalence::EquivalenceTable;
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::protocol_document::{MatchWeightParameters, ProtocolDocument};
use crate::domain::step::{Step, DOSE_EPSILON};
use crate::domain::types::{StepId, TimeOfDay};
use crate::engine::protocol_graph::ProtocolGraph;
use crate::engine::step_matcher::MatchWeights;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 内置方案数据
const BUILTIN_PROTOCOL: &str = include_str!("../../data/taper_protocol.json");

/// 外部方案文件路径环境变量
pub const PROTOCOL_PATH_ENV: &str = "TAPER_PLANNER_PROTOCOL";

// ==========================================
// EngineConfig - 引擎配置
// ==========================================

/// 引擎的全部不可变配置
///
/// 显式传入引擎，不依赖进程级全局状态；测试可构造替代的目录与方案图。
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub catalog: MedicationCatalog,
    pub equivalence: EquivalenceTable,
    pub graph: ProtocolGraph,
    pub match_weights: MatchWeights,
}

impl EngineConfig {
    /// 直接由组件构造
    pub fn new(
        catalog: MedicationCatalog,
        equivalence: EquivalenceTable,
        graph: ProtocolGraph,
    ) -> Self {
        Self {
            catalog,
            equivalence,
            graph,
            match_weights: MatchWeights::default(),
        }
    }

    pub fn with_match_weights(mut self, weights: MatchWeights) -> Self {
        self.match_weights = weights;
        self
    }

    /// 内置方案数据
    pub fn builtin() -> ConfigResult<Self> {
        Self::from_json_str(BUILTIN_PROTOCOL)
    }

    /// 从 JSON 文本加载
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let document: ProtocolDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// 从 JSON 文件加载
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "加载外部方案文件");
        Self::from_json_str(&json)
    }

    /// 外部文件优先，否则使用内置数据
    pub fn load_default() -> ConfigResult<Self> {
        match default_protocol_path() {
            Some(path) => Self::from_path(&path),
            None => Self::builtin(),
        }
    }

    /// 由方案文档构造并校验
    ///
    /// # 校验规则
    /// 1. 目录规格、等效系数均为有限正数
    /// 2. 步骤周数 >= 1，时段剂量为有限正数
    /// 3. 步骤中出现的药物必须在目录中登记
    /// 4. 方案图后继完整、无环、根存在
    pub fn from_document(document: ProtocolDocument) -> ConfigResult<Self> {
        let mut catalog = MedicationCatalog::new();
        for (medication, strengths) in &document.catalog {
            catalog.insert(medication, strengths)?;
        }

        let mut equivalence = EquivalenceTable::new();
        for (medication, factor) in &document.equivalence {
            equivalence.insert(medication, *factor)?;
        }

        let mut steps = Vec::with_capacity(document.steps.len());
        for record in document.steps {
            let step_id = record.step_id();
            if record.weeks == 0 {
                return Err(ConfigError::InvalidStep {
                    step_id: step_id.to_string(),
                    message: "duration must be at least one week".to_string(),
                });
            }

            let successor = record.successor();
            let mut slots = BTreeMap::new();
            for (slot, content) in record.doses {
                let dose = match content {
                    None => continue,
                    Some(raw) => raw.into_slot_dose().ok_or_else(|| ConfigError::InvalidStep {
                        step_id: step_id.to_string(),
                        message: format!("{} slot holds an unrecognized value", slot),
                    })?,
                };
                validate_slot(&step_id, slot, &dose.pairs(), &catalog)?;
                slots.insert(slot, dose);
            }

            steps.push(Step::new(step_id, record.weeks, slots, successor));
        }

        let roots = document
            .roots
            .map(|ids| ids.iter().map(|id| StepId::new(id.trim())).collect());
        let graph = ProtocolGraph::build(steps, roots)?;
        let match_weights = apply_weight_parameters(&document.match_weights)?;

        debug!(
            medications = catalog.len(),
            equivalence_entries = equivalence.len(),
            steps = graph.len(),
            "方案配置加载完成"
        );

        Ok(Self {
            catalog,
            equivalence,
            graph,
            match_weights,
        })
    }
}

fn validate_slot(
    step_id: &StepId,
    slot: TimeOfDay,
    pairs: &[(&str, f64)],
    catalog: &MedicationCatalog,
) -> ConfigResult<()> {
    for (medication, mg) in pairs {
        if !mg.is_finite() || *mg < DOSE_EPSILON {
            return Err(ConfigError::InvalidStep {
                step_id: step_id.to_string(),
                message: format!("{} dose {}mg of {} is not positive", slot, mg, medication),
            });
        }
        if !catalog.contains(medication) {
            return Err(ConfigError::UnknownMedication {
                step_id: step_id.to_string(),
                medication: medication.to_string(),
            });
        }
    }
    Ok(())
}

fn apply_weight_parameters(params: &MatchWeightParameters) -> ConfigResult<MatchWeights> {
    let defaults = MatchWeights::default();
    let weights = MatchWeights {
        medication_match: params.medication_match.unwrap_or(defaults.medication_match),
        dose_match: params.dose_match.unwrap_or(defaults.dose_match),
        dose_mismatch: params.dose_mismatch.unwrap_or(defaults.dose_mismatch),
        equivalence_penalty: params
            .equivalence_penalty
            .unwrap_or(defaults.equivalence_penalty),
    };
    let all = [
        weights.medication_match,
        weights.dose_match,
        weights.dose_mismatch,
        weights.equivalence_penalty,
    ];
    if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ConfigError::InvalidWeights(format!("{:?}", weights)));
    }
    Ok(weights)
}

/// 外部方案文件位置
///
/// 优先级：
/// 1. 环境变量 TAPER_PLANNER_PROTOCOL（非空）
/// 2. 用户配置目录下 taper-planner/protocol.json（存在时）
pub fn default_protocol_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(PROTOCOL_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("taper-planner").join("protocol.json"))
        .filter(|path| path.is_file())
}
