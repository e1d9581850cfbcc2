// ==========================================
// 媒体计划预算核心 - 计划数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

mod plan;
mod version;

pub use plan::MediaPlanRepository;
pub use version::PlanVersionRepository;
