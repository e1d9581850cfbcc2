// ==========================================
// 媒体计划预算核心 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换仓储/引擎错误为用户可读的错误消息
// ==========================================

use crate::domain::hierarchy::HierarchyConfigError;
use crate::engine::snapshot_replay::SnapshotReplayError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 层级配置非法 (存储交互前拒绝)
    #[error("层级配置错误: {0}")]
    HierarchyConfig(#[from] HierarchyConfigError),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::ValidationError(msg),

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 SnapshotReplayError 转换
// ==========================================
impl From<SnapshotReplayError> for ApiError {
    fn from(err: SnapshotReplayError) -> Self {
        match err {
            SnapshotReplayError::PlanNotFound(id) => {
                ApiError::NotFound(format!("MediaPlan(id={})不存在", id))
            }
            SnapshotReplayError::VersionNotFound(id) => {
                ApiError::NotFound(format!("PlanVersion(id={})不存在", id))
            }
            e @ SnapshotReplayError::VersionPlanMismatch { .. } => {
                ApiError::BusinessRuleViolation(e.to_string())
            }
            SnapshotReplayError::InvalidSnapshot(msg) => ApiError::ValidationError(msg),
            SnapshotReplayError::Repository(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
