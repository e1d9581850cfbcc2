// ==========================================
// 媒体计划预算核心 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供计划编辑器在进程内调用
// ==========================================

pub mod budget_api;
pub mod error;

// 重导出核心类型
pub use budget_api::BudgetApi;
pub use error::{ApiError, ApiResult};
