// ==========================================
// 减停排程系统 - 药品目录
// ==========================================
// 职责: 药物名 -> 可用片剂规格 (mg, 升序去重)
// 生命周期: 配置阶段构造一次,此后只读
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::step::DOSE_EPSILON;
use std::collections::BTreeMap;

/// 药品目录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicationCatalog {
    strengths: BTreeMap<String, Vec<f64>>,
}

impl MedicationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记药物规格
    ///
    /// 规格必须为有限正数；重复规格去重，结果升序。
    pub fn insert(&mut self, medication: &str, strengths: &[f64]) -> ConfigResult<()> {
        let name = medication.trim();
        if name.is_empty() {
            return Err(ConfigError::InvalidCatalog {
                medication: medication.to_string(),
                message: "medication name is empty".to_string(),
            });
        }
        if strengths.is_empty() {
            return Err(ConfigError::InvalidCatalog {
                medication: name.to_string(),
                message: "no tablet strengths listed".to_string(),
            });
        }
        if let Some(bad) = strengths.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(ConfigError::InvalidCatalog {
                medication: name.to_string(),
                message: format!("strength {} is not a positive number", bad),
            });
        }

        let mut sorted = strengths.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted.dedup_by(|a, b| (*a - *b).abs() < DOSE_EPSILON);

        self.strengths.insert(name.to_string(), sorted);
        Ok(())
    }

    /// 某药物的可用规格（升序）
    pub fn strengths(&self, medication: &str) -> Option<&[f64]> {
        self.strengths.get(medication).map(|v| v.as_slice())
    }

    pub fn contains(&self, medication: &str) -> bool {
        self.strengths.contains_key(medication)
    }

    /// 全部药物名（字母序）
    pub fn medications(&self) -> Vec<&str> {
        self.strengths.keys().map(|m| m.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.strengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
    }
}
