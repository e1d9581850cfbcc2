// ==========================================
// 媒体计划预算核心 - 投放行领域模型
// ==========================================
// 投放行 (MediaLine) 是树构建的聚合单元, 也是告警的归属单元
// 附属实体: 素材 (Creative) / 月度预算 (MonthlyBudget) / 时段 (Moment)
// ==========================================

use crate::domain::types::HierarchyLevel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// MediaLine - 投放行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaLine {
    // ===== 主键 =====
    pub line_id: String,
    pub plan_id: String,
    pub line_name: String,

    // ===== 预算 =====
    pub budget: f64, // >= 0

    // ===== 层级维度引用 (各自可空) =====
    pub subdivision_id: Option<String>,
    pub moment_id: Option<String>,
    pub funnel_stage_id: Option<String>,

    // ===== 排期 =====
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    // ===== UTM 追踪 =====
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
    pub utm_validated: bool,
}

impl MediaLine {
    /// 新建投放行 (维度/排期/UTM 均为空)
    pub fn new(line_id: &str, plan_id: &str, budget: f64) -> Self {
        Self {
            line_id: line_id.to_string(),
            plan_id: plan_id.to_string(),
            line_name: line_id.to_string(),
            budget,
            subdivision_id: None,
            moment_id: None,
            funnel_stage_id: None,
            start_date: None,
            end_date: None,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            utm_content: None,
            utm_term: None,
            utm_validated: false,
        }
    }

    /// 取该行在指定层级上的维度引用
    ///
    /// 空白字符串视为未设置
    pub fn reference_for(&self, level: HierarchyLevel) -> Option<&str> {
        let value = match level {
            HierarchyLevel::Subdivision => self.subdivision_id.as_deref(),
            HierarchyLevel::Moment => self.moment_id.as_deref(),
            HierarchyLevel::FunnelStage => self.funnel_stage_id.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// 预算 (非有限值按 0 处理)
    pub fn budget_or_zero(&self) -> f64 {
        if self.budget.is_finite() {
            self.budget
        } else {
            0.0
        }
    }

    /// 是否设置了任意 UTM 参数
    pub fn has_any_utm(&self) -> bool {
        [
            &self.utm_source,
            &self.utm_medium,
            &self.utm_campaign,
            &self.utm_content,
            &self.utm_term,
        ]
        .iter()
        .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// 显示名称 (为空时回退到 line_id)
    pub fn display_name(&self) -> &str {
        if self.line_name.trim().is_empty() {
            &self.line_id
        } else {
            &self.line_name
        }
    }
}

// ==========================================
// Creative - 素材
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creative {
    pub creative_id: String,
    pub line_id: String,
    pub creative_name: String,
    pub format_id: Option<String>, // 素材格式引用
}

// ==========================================
// MonthlyBudget - 月度预算子分配
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBudget {
    pub line_id: String,
    pub month: NaiveDate, // 月份 (当月第一天)
    pub amount: f64,
}

// ==========================================
// Moment - 时段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    pub moment_id: String,
    pub plan_id: String,
    pub moment_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
