// ==========================================
// 减停排程系统 - 服药说明生成引擎
// ==========================================
// 职责: 将步骤的毫克剂量渲染为处方行 (规格 + 说明 + 应发片数)
// 输入: 步骤 + 日历区间 + 规格目录
// 输出: 按药物字母序、规格升序排列的处方行
// ==========================================

mod core;
mod wording;

#[cfg(test)]
mod tests;

pub use self::core::InstructionBuilder;
pub use self::wording::{count_word, format_strength, join_phrases, slot_phrase};
