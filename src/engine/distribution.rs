// ==========================================
// 媒体计划预算核心 - 预算分配树构建引擎
// ==========================================
// 红线: 全量替换 (先删后建), 不做增量比对
// 红线: 插入严格按深度顺序, 子节点引用父节点的真实ID
// 红线: 存储失败不抛出, 以结构化结果返回; 不重试, 不回滚
// ==========================================
// 职责: 投放行 + 层级顺序 → 分配节点森林
// 输入: plan_id + HierarchyOrder + 投放行 + 计划总预算
// 输出: DistributionBuildResult
// ==========================================

mod core;
mod planner;
mod store;

#[cfg(test)]
mod tests;

pub use core::{BuildOptions, DistributionBuildResult, DistributionTreeBuilder};
pub use planner::{percent_of, plan_distribution_tree, DistributionPlan, PlannedNode};
pub use store::DistributionStore;
