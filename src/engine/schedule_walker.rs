// ==========================================
// 减停排程系统 - 排程遍历引擎
// ==========================================
// 职责: 从起始步骤沿后继走到终止标记,分配日历区间
// 红线: 重复访问同一步骤即判定为环,报错而非死循环
// ==========================================

use crate::domain::schedule::ScheduleInterval;
use crate::domain::types::{StepId, Successor};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::protocol_graph::ProtocolGraph;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

// ==========================================
// ScheduleWalker - 排程遍历引擎
// ==========================================
pub struct ScheduleWalker {
    // 无状态引擎
}

impl ScheduleWalker {
    pub fn new() -> Self {
        Self {}
    }

    /// 生成从 `start` 到终止步骤（含）的日历区间
    ///
    /// # 返回
    /// - `Ok(Vec<ScheduleInterval>)`: 非空、按时间顺序、首尾相接
    /// - `Err(NotFound)`: 起始步骤不存在
    /// - `Err(MalformedGraph)`: 后继悬空或出现环
    #[instrument(skip(self, graph), fields(start = %start))]
    pub fn walk(
        &self,
        graph: &ProtocolGraph,
        start: &StepId,
        start_date: NaiveDate,
    ) -> EngineResult<Vec<ScheduleInterval>> {
        let mut step = graph.step(start)?;
        let mut cursor = start_date;
        let mut visited: HashSet<&StepId> = HashSet::new();
        let mut intervals = Vec::new();

        loop {
            if !visited.insert(&step.id) {
                warn!(step = %step.id, "排程遍历检测到环");
                return Err(EngineError::MalformedGraph(format!(
                    "cycle detected: step '{}' revisited while walking from '{}'",
                    step.id, start
                )));
            }

            let interval = ScheduleInterval::starting(step.id.clone(), step.weeks, cursor);
            cursor = interval.next_start();
            intervals.push(interval);

            match &step.next {
                Successor::End => break,
                Successor::Next(next) => {
                    step = graph.get(next).ok_or_else(|| {
                        EngineError::MalformedGraph(format!(
                            "step '{}' points to unknown step '{}'",
                            step.id, next
                        ))
                    })?;
                }
            }
        }

        debug!(
            steps = intervals.len(),
            end_date = ?intervals.last().map(|i| i.end_date),
            "排程遍历完成"
        );
        Ok(intervals)
    }
}

impl Default for ScheduleWalker {
    fn default() -> Self {
        Self::new()
    }
}
