// ==========================================
// 减停排程系统 - 排程导出
// ==========================================
// 职责: 将排程渲染为文本 / JSON / CSV
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::schedule::{PrescriptionLine, TaperPlan, DATE_FORMAT};
use crate::engine::instruction_builder::format_strength;
use csv::Writer;
use serde::Serialize;
use std::fmt::Write as _;

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Json,
    Csv,
}

/// CSV 行
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    step: &'a str,
    medication: &'a str,
    strength: String,
    instructions: &'a str,
    quantity: u32,
}

impl<'a> From<&'a PrescriptionLine> for CsvRow<'a> {
    fn from(line: &'a PrescriptionLine) -> Self {
        Self {
            step: line.step.as_str(),
            medication: &line.medication,
            strength: format_strength(line.strength_mg),
            instructions: &line.instructions,
            quantity: line.quantity,
        }
    }
}

/// 按格式渲染
pub fn render(plan: &TaperPlan, format: ExportFormat) -> ApiResult<String> {
    match format {
        ExportFormat::Text => Ok(to_text(plan)),
        ExportFormat::Json => to_json(plan),
        ExportFormat::Csv => to_csv(&plan.lines),
    }
}

/// 处方行 CSV（含表头）
pub fn to_csv(lines: &[PrescriptionLine]) -> ApiResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    for line in lines {
        writer.serialize(CsvRow::from(line))?;
    }
    writer.flush().map_err(|e| ApiError::Export(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Export(e.to_string()))
}

/// 完整排程 JSON
pub fn to_json(plan: &TaperPlan) -> ApiResult<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// 终端可读文本
pub fn to_text(plan: &TaperPlan) -> String {
    let mut out = String::new();
    let end = plan
        .end_date()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    let start = plan
        .intervals
        .first()
        .map(|i| i.start_date.format(DATE_FORMAT).to_string())
        .unwrap_or_default();

    let _ = writeln!(
        out,
        "Taper schedule from step {} ({} steps, {} days, {} to {})",
        plan.start_step,
        plan.intervals.len(),
        plan.total_days(),
        start,
        end
    );

    for interval in &plan.intervals {
        let _ = writeln!(
            out,
            "\n[{}] {} to {}",
            interval.step_id,
            interval.start_date.format(DATE_FORMAT),
            interval.end_date.format(DATE_FORMAT)
        );
        for line in plan.lines.iter().filter(|l| l.step == interval.step_id) {
            let _ = writeln!(
                out,
                "  {} {} (dispense {})\n    {}",
                line.medication,
                format_strength(line.strength_mg),
                line.quantity,
                line.instructions
            );
        }
    }
    out
}
