// ==========================================
// 媒体计划预算核心 - 媒体计划领域模型
// ==========================================
// 计划的标量字段 (总预算/起止日期/层级顺序) 对本核心只读
// 版本快照用于历史回溯, 恢复时保留原始ID
// ==========================================

use crate::domain::distribution::BudgetDistribution;
use crate::domain::hierarchy::HierarchyOrder;
use crate::domain::line::MediaLine;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// MediaPlan - 媒体计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPlan {
    pub plan_id: String,                  // 计划ID
    pub plan_name: String,                // 计划名称
    pub total_budget: f64,                // 总预算
    pub start_date: Option<NaiveDate>,    // 开始日期
    pub end_date: Option<NaiveDate>,      // 结束日期
    pub hierarchy_order: HierarchyOrder,  // 层级顺序
    pub created_by: String,               // 创建人
    pub created_at: NaiveDateTime,        // 创建时间
    pub updated_at: NaiveDateTime,        // 更新时间
}

// ==========================================
// PlanVersion - 计划版本
// ==========================================
// 用途: 历史回溯, 恢复前后各记录一次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanVersion {
    pub version_id: String,        // 版本ID
    pub plan_id: String,           // 关联计划
    pub version_no: i32,           // 版本号 (计划内递增)
    pub snapshot_json: String,     // PlanSnapshot 序列化
    pub note: Option<String>,      // 备注
    pub created_by: Option<String>,// 创建人
    pub created_at: NaiveDateTime, // 创建时间
}

impl PlanVersion {
    /// 解析快照
    pub fn snapshot(&self) -> serde_json::Result<PlanSnapshot> {
        serde_json::from_str(&self.snapshot_json)
    }
}

// ==========================================
// PlanSnapshot - 计划状态快照
// ==========================================
// 记录恢复所需的全部行 (含原始ID)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub plan_id: String,
    pub total_budget: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub hierarchy_order: HierarchyOrder,
    pub lines: Vec<MediaLine>,
    pub distributions: Vec<BudgetDistribution>,
    pub captured_at: NaiveDateTime,
}

impl PlanSnapshot {
    /// 从当前计划状态构造快照
    pub fn capture(
        plan: &MediaPlan,
        lines: Vec<MediaLine>,
        distributions: Vec<BudgetDistribution>,
        captured_at: NaiveDateTime,
    ) -> Self {
        Self {
            plan_id: plan.plan_id.clone(),
            total_budget: plan.total_budget,
            start_date: plan.start_date,
            end_date: plan.end_date,
            hierarchy_order: plan.hierarchy_order.clone(),
            lines,
            distributions,
            captured_at,
        }
    }
}
