// ==========================================
// 减停排程系统 - 引擎编排器
// ==========================================
// 用途: 协调四个核心引擎的执行顺序
// 流程: 输入校验 → 步骤匹配 → 排程遍历 → 服药说明
// 红线: 要么返回完整处方行列表,要么返回唯一错误,不输出部分结果
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::domain::patient::{MedicationDoses, TaperRequest};
use crate::domain::schedule::{ScheduleInterval, TaperPlan};
use crate::domain::types::StepId;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::instruction_builder::InstructionBuilder;
use crate::engine::schedule_walker::ScheduleWalker;
use crate::engine::step_matcher::{StepMatch, StepMatcher};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// TaperEngine - 引擎编排器
// ==========================================

/// 排程引擎入口
///
/// 配置只读，通过 `Arc` 在多个调用方之间共享；各子引擎无状态，
/// 因此同一实例可被多个线程同时调用。
pub struct TaperEngine {
    config: Arc<EngineConfig>,
    matcher: StepMatcher,
    walker: ScheduleWalker,
    builder: InstructionBuilder,
}

impl TaperEngine {
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 方案图 + 规格目录 + 等效剂量表
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            matcher: StepMatcher::new(config.match_weights),
            walker: ScheduleWalker::new(),
            builder: InstructionBuilder::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 执行完整排程流程
    ///
    /// # 返回
    /// - `Ok(TaperPlan)`: 匹配起点 + 日历区间 + 处方行
    /// - `Err(EngineError)`: 四类错误之一
    #[instrument(skip_all, fields(
        primary = %request.primary.medication,
        secondary = ?request.secondary.as_ref().map(|s| s.medication.as_str()),
        start_date = %request.start_date,
    ))]
    pub fn plan(&self, request: &TaperRequest) -> EngineResult<TaperPlan> {
        info!("开始生成减停排程");

        // ==========================================
        // 步骤1: 输入校验
        // ==========================================
        self.validate_request(request)?;

        // ==========================================
        // 步骤2: 步骤匹配
        // ==========================================
        let matched = self.match_step(&request.primary, request.secondary.as_ref())?;

        // ==========================================
        // 步骤3: 排程遍历
        // ==========================================
        let intervals = self.schedule_from(&matched.start, request.start_date)?;

        // ==========================================
        // 步骤4: 服药说明
        // ==========================================
        debug!(intervals = intervals.len(), "生成处方行");
        let lines = self
            .builder
            .build_all(&self.config.catalog, &self.config.graph, &intervals)?;

        let plan = TaperPlan {
            start_step: matched.start,
            intervals,
            lines,
        };

        info!(
            start_step = %plan.start_step,
            steps = plan.intervals.len(),
            lines = plan.lines.len(),
            end_date = ?plan.end_date(),
            "减停排程生成完成"
        );
        Ok(plan)
    }

    /// 步骤匹配（不遍历）
    pub fn match_step(
        &self,
        primary: &MedicationDoses,
        secondary: Option<&MedicationDoses>,
    ) -> EngineResult<StepMatch> {
        self.matcher.find_match(
            &self.config.graph,
            &self.config.equivalence,
            primary,
            secondary,
        )
    }

    /// 从指定步骤开始遍历（不匹配）
    pub fn schedule_from(
        &self,
        start: &StepId,
        start_date: NaiveDate,
    ) -> EngineResult<Vec<ScheduleInterval>> {
        self.walker.walk(&self.config.graph, start, start_date)
    }

    /// 校验患者输入
    ///
    /// 药物名须出现在规格目录或等效剂量表中；剂量须为有限非负数。
    pub fn validate_request(&self, request: &TaperRequest) -> EngineResult<()> {
        for reported in request.reported() {
            let known = self.config.catalog.contains(&reported.medication)
                || self.config.equivalence.contains(&reported.medication);
            if !known {
                return Err(EngineError::InvalidInput(format!(
                    "unknown medication '{}'",
                    reported.medication
                )));
            }

            for (slot, mg) in &reported.doses {
                if !mg.is_finite() || *mg < 0.0 {
                    return Err(EngineError::InvalidInput(format!(
                        "{} dose of {} must be a non-negative number, got {}",
                        slot, reported.medication, mg
                    )));
                }
            }
        }
        Ok(())
    }
}
