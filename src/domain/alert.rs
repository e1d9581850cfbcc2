// ==========================================
// 媒体计划预算核心 - 计划告警值对象
// ==========================================
// 告警为派生值对象, 从不持久化; 每次评估从零重新计算
// id 为确定性组合键 (类别前缀 + 受影响实体ID), 用于去重与 UI 键
// ==========================================

use crate::domain::types::{AlertCategory, AlertLevel};
use serde::{Deserialize, Serialize};

// ==========================================
// PlanAlert - 计划告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAlert {
    pub id: String,
    pub level: AlertLevel,
    pub category: AlertCategory,
    pub title: String,
    pub description: String,
    pub action: String,
    pub line_id: Option<String>,
    /// 告警涉及的金额 (超额/差额/剩余等)
    pub amount: Option<f64>,
    /// 告警涉及的百分比
    pub percentage: Option<f64>,
}

impl PlanAlert {
    pub fn new(
        id: String,
        level: AlertLevel,
        category: AlertCategory,
        title: String,
        description: String,
        action: String,
    ) -> Self {
        Self {
            id,
            level,
            category,
            title,
            description,
            action,
            line_id: None,
            amount: None,
            percentage: None,
        }
    }

    pub fn with_line(mut self, line_id: &str) -> Self {
        self.line_id = Some(line_id.to_string());
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }
}
