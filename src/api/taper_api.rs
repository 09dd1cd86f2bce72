// ==========================================
// 减停排程系统 - 排程 API
// ==========================================
// 职责: 接收表单字符串,校验后调用引擎,返回排程或可展示的错误
// 流程: 表单 → validator → TaperRequest → TaperEngine → TaperResponse
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{normalize_medication, parse_dose, parse_start_date};
use crate::config::engine_config::EngineConfig;
use crate::domain::patient::{MedicationDoses, TaperRequest};
use crate::domain::schedule::TaperPlan;
use crate::engine::orchestrator::TaperEngine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 替代药固定为地西泮
pub const SECONDARY_MEDICATION: &str = "diazepam";

// ==========================================
// 请求 / 响应
// ==========================================

/// 四个时段的剂量字段（原始字符串，空白视为 0）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoseFields {
    pub morning: String,
    pub midday: String,
    pub afternoon: String,
    pub night: String,
}

impl DoseFields {
    pub fn new(morning: &str, midday: &str, afternoon: &str, night: &str) -> Self {
        Self {
            morning: morning.to_string(),
            midday: midday.to_string(),
            afternoon: afternoon.to_string(),
            night: night.to_string(),
        }
    }

    fn parse(&self, medication: &str) -> ApiResult<MedicationDoses> {
        let field = |slot: &str| format!("{} {}", medication, slot);
        Ok(MedicationDoses::from_slots(
            medication,
            parse_dose(&field("Morning"), &self.morning)?,
            parse_dose(&field("Midday"), &self.midday)?,
            parse_dose(&field("Afternoon"), &self.afternoon)?,
            parse_dose(&field("Night"), &self.night)?,
        ))
    }
}

/// 排程表单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaperForm {
    pub medication: String,
    #[serde(default)]
    pub doses: DoseFields,
    /// 勾选"同时服用地西泮"时填写
    #[serde(default)]
    pub diazepam: Option<DoseFields>,
    /// M/D/YYYY
    pub start_date: String,
}

/// 错误详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// 排程响应：成功时带排程，失败时带错误
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaperResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<TaperPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl TaperResponse {
    fn ok(plan: TaperPlan) -> Self {
        Self {
            success: true,
            plan: Some(plan),
            error: None,
        }
    }

    fn failed(err: &ApiError) -> Self {
        Self {
            success: false,
            plan: None,
            error: Some(ErrorBody {
                code: err.code().to_string(),
                message: err.user_message(),
            }),
        }
    }
}

// ==========================================
// TaperApi - 排程 API
// ==========================================

pub struct TaperApi {
    engine: Arc<TaperEngine>,
}

impl TaperApi {
    pub fn new(engine: Arc<TaperEngine>) -> Self {
        Self { engine }
    }

    /// 由配置直接构造
    pub fn from_config(config: EngineConfig) -> Self {
        Self::new(Arc::new(TaperEngine::new(Arc::new(config))))
    }

    /// 可选药物（目录中的药物，字母序）
    pub fn medications(&self) -> Vec<String> {
        self.engine
            .config()
            .catalog
            .medications()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// 表单 → 引擎请求
    pub fn build_request(&self, form: &TaperForm) -> ApiResult<TaperRequest> {
        let medication = normalize_medication(&form.medication)?;
        let primary = form.doses.parse(&medication)?;
        let secondary = form
            .diazepam
            .as_ref()
            .map(|fields| fields.parse(SECONDARY_MEDICATION))
            .transpose()?;
        let start_date = parse_start_date(&form.start_date)?;

        let request = TaperRequest::new(primary, start_date);
        Ok(match secondary {
            Some(doses) => request.with_secondary(doses),
            None => request,
        })
    }

    /// 直接以结构化请求生成排程
    pub fn plan(&self, request: &TaperRequest) -> ApiResult<TaperPlan> {
        Ok(self.engine.plan(request)?)
    }

    /// 表单 → 排程
    pub fn plan_from_form(&self, form: &TaperForm) -> ApiResult<TaperPlan> {
        let request = self.build_request(form)?;
        self.plan(&request)
    }

    /// 表单 → 响应（错误转换为可展示的消息）
    #[instrument(skip_all, fields(medication = %form.medication))]
    pub fn handle(&self, form: &TaperForm) -> TaperResponse {
        match self.plan_from_form(form) {
            Ok(plan) => {
                info!(lines = plan.lines.len(), "排程请求处理成功");
                TaperResponse::ok(plan)
            }
            Err(err) => {
                warn!(code = err.code(), error = %err, "排程请求处理失败");
                TaperResponse::failed(&err)
            }
        }
    }
}
