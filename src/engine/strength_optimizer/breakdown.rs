use crate::domain::step::DOSE_EPSILON;
use serde::Serialize;

/// 某规格的片数（整数片或 .5 片）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TabletCount {
    pub strength_mg: f64,
    pub count: f64,
}

/// 单个剂量的片剂拆分
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub dose_mg: f64,
    /// 按规格降序
    pub counts: Vec<TabletCount>,
}

impl Breakdown {
    /// 某规格的片数，未使用为 0
    pub fn count_for(&self, strength_mg: f64) -> f64 {
        self.counts
            .iter()
            .find(|c| same_strength(c.strength_mg, strength_mg))
            .map(|c| c.count)
            .unwrap_or(0.0)
    }

    pub fn uses(&self, strength_mg: f64) -> bool {
        self.count_for(strength_mg) > 0.0
    }

    /// 总片数（半片计 0.5）
    pub fn total_tablets(&self) -> f64 {
        self.counts.iter().map(|c| c.count).sum()
    }

    /// Σ 规格 × 片数
    pub fn delivered_mg(&self) -> f64 {
        self.counts.iter().map(|c| c.strength_mg * c.count).sum()
    }

    /// 至少包含一整片
    pub fn has_whole_tablet(&self) -> bool {
        self.counts.iter().any(|c| c.count >= 1.0 - DOSE_EPSILON)
    }

    /// 不含半片
    pub fn is_whole_only(&self) -> bool {
        self.counts
            .iter()
            .all(|c| (c.count - c.count.round()).abs() < DOSE_EPSILON)
    }
}

pub(crate) fn same_strength(a: f64, b: f64) -> bool {
    (a - b).abs() < DOSE_EPSILON
}

/// 用给定规格组合表达一个剂量
///
/// 规格从大到小贪心取整片；余量若恰为某规格的一半（从大到小找），补半片；
/// 余量最终必须在容差内为 0，否则返回 None。
pub fn breakdown_dose(dose_mg: f64, strengths: &[f64]) -> Option<Breakdown> {
    let mut ordered = strengths.to_vec();
    ordered.sort_by(|a, b| b.total_cmp(a));

    let mut remaining = dose_mg;
    let mut counts: Vec<TabletCount> = Vec::new();

    for strength in &ordered {
        let whole = ((remaining + DOSE_EPSILON) / strength).floor();
        if whole >= 1.0 {
            counts.push(TabletCount {
                strength_mg: *strength,
                count: whole,
            });
            remaining -= whole * strength;
        }
    }

    if remaining.abs() >= DOSE_EPSILON {
        let half = ordered
            .iter()
            .find(|s| (remaining - *s / 2.0).abs() < DOSE_EPSILON)?;
        match counts.iter_mut().find(|c| same_strength(c.strength_mg, *half)) {
            Some(existing) => existing.count += 0.5,
            None => counts.push(TabletCount {
                strength_mg: *half,
                count: 0.5,
            }),
        }
    }

    counts.sort_by(|a, b| b.strength_mg.total_cmp(&a.strength_mg));
    Some(Breakdown { dose_mg, counts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_then_half() {
        let bd = breakdown_dose(0.75, &[0.5]).unwrap();
        assert_eq!(bd.count_for(0.5), 1.5);
        assert!(bd.has_whole_tablet());
        assert!(!bd.is_whole_only());
    }

    #[test]
    fn test_greedy_largest_first() {
        let bd = breakdown_dose(18.0, &[2.0, 5.0]).unwrap();
        // 5×3 = 15, 余 3 → 2×1, 余 1 = 2 的一半
        assert_eq!(bd.count_for(5.0), 3.0);
        assert_eq!(bd.count_for(2.0), 1.5);
        assert!((bd.delivered_mg() - 18.0).abs() < DOSE_EPSILON);
    }

    #[test]
    fn test_bare_half_tablet() {
        let bd = breakdown_dose(5.0, &[10.0]).unwrap();
        assert_eq!(bd.count_for(10.0), 0.5);
        assert!(!bd.has_whole_tablet());
        assert_eq!(bd.total_tablets(), 0.5);
    }

    #[test]
    fn test_unrepresentable_remainder() {
        assert!(breakdown_dose(0.6, &[1.0, 2.0]).is_none());
        assert!(breakdown_dose(3.0, &[2.0]).is_some());
        assert!(breakdown_dose(0.3, &[2.0]).is_none());
    }
}
