// ==========================================
// 减停排程系统 - API 层
// ==========================================
// 职责: 表单校验、调用引擎、错误消息转换与排程导出,供 CLI 调用
// ==========================================

pub mod error;
pub mod export;
pub mod taper_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult, INVALID_DATE_MESSAGE, NO_MATCH_MESSAGE};
pub use export::{render, to_csv, to_json, to_text, ExportFormat};
pub use taper_api::{DoseFields, ErrorBody, TaperApi, TaperForm, TaperResponse, SECONDARY_MEDICATION};
pub use validator::{normalize_medication, parse_dose, parse_start_date};
