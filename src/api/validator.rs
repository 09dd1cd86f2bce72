// ==========================================
// 减停排程系统 - 表单输入校验器
// ==========================================
// 职责: 将表单字符串解析为日期与剂量,调用引擎前完成格式校验
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use chrono::NaiveDate;

/// 表单日期格式 (M/D/YYYY，月日可不补零)
const FORM_DATE_FORMAT: &str = "%m/%d/%Y";

/// 解析起始日期
///
/// 接受 `1/5/2026` 与 `01/05/2026`；其他格式返回 `InvalidDate`。
pub fn parse_start_date(raw: &str) -> ApiResult<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::MissingField("start date".to_string()));
    }
    NaiveDate::parse_from_str(trimmed, FORM_DATE_FORMAT)
        .map_err(|_| ApiError::InvalidDate(trimmed.to_string()))
}

/// 解析时段剂量，空白视为 0
///
/// # 返回
/// - `Ok(mg)`: 有限非负数
/// - `Err(InvalidNumber)`: 无法解析、非有限或为负
pub fn parse_dose(field: &str, raw: &str) -> ApiResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(mg) if mg.is_finite() && mg >= 0.0 => Ok(mg),
        _ => Err(ApiError::InvalidNumber {
            field: field.to_string(),
            value: trimmed.to_string(),
        }),
    }
}

/// 药物名：去空白、转小写；为空返回 `MissingField`
pub fn normalize_medication(raw: &str) -> ApiResult<String> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() {
        return Err(ApiError::MissingField("medication".to_string()));
    }
    Ok(name)
}
