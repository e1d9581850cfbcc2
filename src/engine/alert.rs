// ==========================================
// 媒体计划预算核心 - 一致性告警引擎
// ==========================================
// 红线: 纯函数, 不访问存储, 不修改状态
// 红线: 输入不一致只产生告警, 从不报错或 panic
// 红线: 金额比较统一使用 epsilon (默认 0.01)
// ==========================================
// 职责: 计划快照 → 分级/分类告警
// 输入: PlanAlertInput (投放行/素材/分配节点/月度预算/时段/层级顺序)
// 输出: PlanAlertReport
// ==========================================

mod core;
mod report;
mod rules;


pub use core::{AlertThresholds, PlanAlertEngine, PlanAlertInput};
pub use report::PlanAlertReport;
pub use rules::{AlertRule, ALERT_RULES};
