// ==========================================
// 媒体计划预算核心 - 操作日志数据仓储
// ==========================================
// 红线: 层级变更 / 分配树重建 / 版本操作必须记录
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
