// ==========================================
// 减停排程系统 - 方案图
// ==========================================
// 职责: 以 arena 保存全部步骤,按稳定 id 索引
// 红线: 后继引用完整性与无环性在加载时校验,不在遍历时才发现
// ==========================================

use crate::domain::step::Step;
use crate::domain::types::{StepId, Successor};
use crate::engine::error::{EngineError, EngineResult};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

// ==========================================
// ProtocolGraph - 方案图
// ==========================================

/// 不可变方案图（加载后只读，可在线程间共享）
#[derive(Debug, Clone, Default)]
pub struct ProtocolGraph {
    steps: Vec<Step>,
    index: HashMap<StepId, usize>,
    roots: Vec<usize>,
}

impl ProtocolGraph {
    /// 构建并校验方案图
    ///
    /// # 参数
    /// - `steps`: 全部步骤
    /// - `roots`: 指定的根步骤（按评估顺序）；为 None 时取无前驱步骤并按 id 排序
    ///
    /// # 校验
    /// 1. 步骤 id 不重复
    /// 2. 所有后继引用存在
    /// 3. 图无环
    /// 4. 指定的根步骤存在
    pub fn build(steps: Vec<Step>, roots: Option<Vec<StepId>>) -> EngineResult<Self> {
        let graph = Self::assemble(steps, roots)?;
        graph.check_successors()?;
        graph.check_acyclic()?;
        debug!(
            steps = graph.steps.len(),
            roots = graph.roots.len(),
            "方案图校验通过"
        );
        Ok(graph)
    }

    /// 构建方案图但跳过后继与环校验
    ///
    /// 仅保证 id 唯一；悬空引用与环留给遍历时报告。用于回放来源不可信的数据。
    pub fn build_unchecked(steps: Vec<Step>, roots: Option<Vec<StepId>>) -> EngineResult<Self> {
        Self::assemble(steps, roots)
    }

    fn assemble(steps: Vec<Step>, roots: Option<Vec<StepId>>) -> EngineResult<Self> {
        let mut index = HashMap::with_capacity(steps.len());
        for (pos, step) in steps.iter().enumerate() {
            if index.insert(step.id.clone(), pos).is_some() {
                return Err(EngineError::MalformedGraph(format!(
                    "duplicate step id '{}'",
                    step.id
                )));
            }
        }

        let roots = match roots {
            Some(ids) => ids
                .iter()
                .map(|id| {
                    index.get(id).copied().ok_or_else(|| {
                        EngineError::MalformedGraph(format!("root step '{}' does not exist", id))
                    })
                })
                .collect::<EngineResult<Vec<_>>>()?,
            None => Self::infer_roots(&steps),
        };

        Ok(Self {
            steps,
            index,
            roots,
        })
    }

    /// 无前驱的步骤，按 id 字典序
    fn infer_roots(steps: &[Step]) -> Vec<usize> {
        let targets: HashSet<&StepId> = steps.iter().filter_map(|s| s.next.step_id()).collect();
        let mut roots: Vec<usize> = (0..steps.len())
            .filter(|pos| !targets.contains(&steps[*pos].id))
            .collect();
        roots.sort_by(|a, b| steps[*a].id.cmp(&steps[*b].id));
        roots
    }

    fn check_successors(&self) -> EngineResult<()> {
        for step in &self.steps {
            if let Successor::Next(next) = &step.next {
                if !self.index.contains_key(next) {
                    warn!(step = %step.id, next = %next, "后继步骤不存在");
                    return Err(EngineError::MalformedGraph(format!(
                        "step '{}' points to unknown step '{}'",
                        step.id, next
                    )));
                }
            }
        }
        Ok(())
    }

    /// 每个步骤至多一条出边，沿链着色即可判环
    fn check_acyclic(&self) -> EngineResult<()> {
        // 0 = 未访问, 1 = 当前链上, 2 = 已确认可达终点
        let mut state = vec![0u8; self.steps.len()];

        for start in 0..self.steps.len() {
            if state[start] != 0 {
                continue;
            }
            let mut chain = Vec::new();
            let mut cursor = Some(start);
            while let Some(pos) = cursor {
                match state[pos] {
                    2 => break,
                    1 => {
                        warn!(step = %self.steps[pos].id, "方案图存在环");
                        return Err(EngineError::MalformedGraph(format!(
                            "cycle detected through step '{}'",
                            self.steps[pos].id
                        )));
                    }
                    _ => {}
                }
                state[pos] = 1;
                chain.push(pos);
                cursor = self.steps[pos]
                    .next
                    .step_id()
                    .and_then(|id| self.index.get(id).copied());
            }
            for pos in chain {
                state[pos] = 2;
            }
        }
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get(&self, id: &StepId) -> Option<&Step> {
        self.index.get(id).map(|pos| &self.steps[*pos])
    }

    /// 按 id 解析步骤，不存在时返回 NotFound
    pub fn step(&self, id: &StepId) -> EngineResult<&Step> {
        self.get(id)
            .ok_or_else(|| EngineError::NotFound(format!("step '{}' does not exist", id)))
    }

    pub fn contains(&self, id: &StepId) -> bool {
        self.index.contains_key(id)
    }

    pub fn roots(&self) -> impl Iterator<Item = &Step> {
        self.roots.iter().map(|pos| &self.steps[*pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 确定性的评估顺序
    ///
    /// 依次从每个根出发沿后继前进，遇到终止标记、悬空引用或已访问步骤即停止该链。
    pub fn evaluation_order(&self) -> Vec<&Step> {
        let mut seen = HashSet::with_capacity(self.steps.len());
        let mut order = Vec::with_capacity(self.steps.len());

        for root in &self.roots {
            let mut cursor = Some(*root);
            while let Some(pos) = cursor {
                if !seen.insert(pos) {
                    break;
                }
                let step = &self.steps[pos];
                order.push(step);
                cursor = step.next.step_id().and_then(|id| self.index.get(id).copied());
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{SlotDose, TimeOfDay};
    use std::collections::BTreeMap;

    fn step(id: &str, next: Option<&str>) -> Step {
        let mut slots = BTreeMap::new();
        slots.insert(TimeOfDay::Night, SlotDose::Single("diazepam".into(), 2.0));
        Step::new(
            StepId::from(id),
            1,
            slots,
            next.map(|n| Successor::Next(StepId::from(n)))
                .unwrap_or(Successor::End),
        )
    }

    #[test]
    fn test_build_infers_roots_sorted_by_id() {
        let graph = ProtocolGraph::build(
            vec![
                step("b_0", Some("c")),
                step("a_0", Some("c")),
                step("c", None),
            ],
            None,
        )
        .unwrap();
        let roots: Vec<_> = graph.roots().map(|s| s.id.as_str()).collect();
        assert_eq!(roots, vec!["a_0", "b_0"]);
    }

    #[test]
    fn test_evaluation_order_skips_visited_chains() {
        let graph = ProtocolGraph::build(
            vec![
                step("a_0", Some("shared")),
                step("b_0", Some("b_1")),
                step("b_1", Some("shared")),
                step("shared", None),
            ],
            None,
        )
        .unwrap();
        let order: Vec<_> = graph.evaluation_order().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["a_0", "shared", "b_0", "b_1"]);
    }

    #[test]
    fn test_dangling_successor_is_rejected() {
        let err = ProtocolGraph::build(vec![step("a", Some("missing"))], None).unwrap_err();
        assert!(matches!(err, EngineError::MalformedGraph(_)));
    }

    #[test]
    fn test_cycle_is_rejected_at_build() {
        let err = ProtocolGraph::build(
            vec![step("r", Some("a")), step("a", Some("b")), step("b", Some("a"))],
            Some(vec![StepId::from("r")]),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::MalformedGraph(ref m) if m.contains("cycle")));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let err = ProtocolGraph::build(vec![step("a", None), step("a", None)], None).unwrap_err();
        assert!(matches!(err, EngineError::MalformedGraph(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn test_unknown_root_is_rejected() {
        let err =
            ProtocolGraph::build(vec![step("a", None)], Some(vec![StepId::from("zz")])).unwrap_err();
        assert!(matches!(err, EngineError::MalformedGraph(_)));
    }

    #[test]
    fn test_unchecked_cycle_evaluation_order_terminates() {
        let graph = ProtocolGraph::build_unchecked(
            vec![step("a", Some("b")), step("b", Some("a"))],
            Some(vec![StepId::from("a"), StepId::from("b")]),
        )
        .unwrap();
        assert_eq!(graph.evaluation_order().len(), 2);
    }
}
