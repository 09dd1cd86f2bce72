// ==========================================
// 减停排程系统 - 等效剂量表
// ==========================================
// 职责: 药物名 -> 换算为地西泮等效剂量的系数
// 规则: 未知药物系数为 0（仅用于评分比较,不报错）
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use std::collections::BTreeMap;

/// 等效剂量表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquivalenceTable {
    factors: BTreeMap<String, f64>,
}

impl EquivalenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记换算系数（必须为有限正数）
    pub fn insert(&mut self, medication: &str, factor: f64) -> ConfigResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ConfigError::InvalidEquivalence {
                medication: medication.to_string(),
                factor,
            });
        }
        self.factors.insert(medication.trim().to_string(), factor);
        Ok(())
    }

    /// 换算系数，未知药物返回 0
    pub fn factor(&self, medication: &str) -> f64 {
        self.factors.get(medication).copied().unwrap_or(0.0)
    }

    /// mg × 系数
    pub fn equivalent(&self, medication: &str, mg: f64) -> f64 {
        mg * self.factor(medication)
    }

    pub fn contains(&self, medication: &str) -> bool {
        self.factors.contains_key(medication)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}
