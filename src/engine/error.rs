// ==========================================
// 减停排程系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 请求要么完整成功,要么以唯一一种错误失败,不返回部分结果
// ==========================================

use thiserror::Error;

/// 引擎错误类型
///
/// 计算是确定性的，所有错误均不可重试（相同输入必然复现）。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 剂量为负/非有限值，或药物名未知
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 没有步骤得分高于初始阈值，或方案图没有根步骤
    #[error("not found: {0}")]
    NotFound(String),

    /// 所需剂量无法用现有片剂规格表达
    #[error("cannot express {dose}mg of {medication} with tablet strengths {strengths:?}")]
    Unrepresentable {
        medication: String,
        dose: f64,
        strengths: Vec<f64>,
    },

    /// 后继引用悬空，或遍历中检测到环
    #[error("malformed protocol graph: {0}")]
    MalformedGraph(String),
}

impl EngineError {
    /// 稳定的错误码（日志与导出使用）
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) => "INVALID_INPUT",
            EngineError::NotFound(_) => "NOT_FOUND",
            EngineError::Unrepresentable { .. } => "UNREPRESENTABLE",
            EngineError::MalformedGraph(_) => "MALFORMED_GRAPH",
        }
    }
}

/// 引擎层 Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
