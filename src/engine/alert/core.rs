use crate::domain::alert::PlanAlert;
use crate::domain::distribution::BudgetDistribution;
use crate::domain::hierarchy::HierarchyOrder;
use crate::domain::line::{Creative, MediaLine, Moment, MonthlyBudget};
use crate::i18n::DEFAULT_LOCALE;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::report::PlanAlertReport;
use super::rules::{RuleContext, ALERT_RULES};

// ==========================================
// AlertThresholds - 告警阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// 单行占计划总预算比例上限
    pub concentration_ratio: f64,
    /// 已分配/总预算 低于该比例视为未充分使用
    pub underutilization_ratio: f64,
    /// 金额比较容差
    pub money_epsilon: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            concentration_ratio: 0.5,
            underutilization_ratio: 0.8,
            money_epsilon: 0.01,
        }
    }
}

// ==========================================
// PlanAlertInput - 告警评估输入快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAlertInput {
    pub plan_id: String,
    pub total_budget: f64,
    pub lines: Vec<MediaLine>,
    pub creatives_by_line: HashMap<String, Vec<Creative>>,
    pub distributions: Vec<BudgetDistribution>,
    pub monthly_budgets_by_line: HashMap<String, Vec<MonthlyBudget>>,
    pub plan_start_date: Option<NaiveDate>,
    pub plan_end_date: Option<NaiveDate>,
    pub moments: Vec<Moment>,
    pub hierarchy_order: HierarchyOrder,
    /// 评估日 ("已结束" 判定基准)
    pub today: NaiveDate,
    /// 告警文案语言
    pub locale: String,
}

impl PlanAlertInput {
    /// 创建仅含计划标量的输入, 其余集合为空
    pub fn new(plan_id: &str, total_budget: f64, today: NaiveDate) -> Self {
        Self {
            plan_id: plan_id.to_string(),
            total_budget,
            lines: Vec::new(),
            creatives_by_line: HashMap::new(),
            distributions: Vec::new(),
            monthly_budgets_by_line: HashMap::new(),
            plan_start_date: None,
            plan_end_date: None,
            moments: Vec::new(),
            hierarchy_order: HierarchyOrder::empty(),
            today,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

// ==========================================
// PlanAlertEngine - 一致性告警引擎
// ==========================================
// 无状态引擎: 阈值在构造时传入
#[derive(Debug, Clone, Default)]
pub struct PlanAlertEngine {
    thresholds: AlertThresholds,
}

impl PlanAlertEngine {
    /// 使用默认阈值创建引擎
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定阈值创建引擎
    pub fn with_thresholds(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// 评估计划告警
    ///
    /// 按注册顺序执行全部规则, 结果按 id 去重 (先出现者保留)
    pub fn evaluate(&self, input: &PlanAlertInput) -> PlanAlertReport {
        let ctx = RuleContext::new(input, &self.thresholds);

        let mut seen: HashSet<String> = HashSet::new();
        let mut alerts: Vec<PlanAlert> = Vec::new();

        for &(name, rule) in ALERT_RULES {
            let produced = rule(&ctx);
            if !produced.is_empty() {
                debug!(plan_id = %input.plan_id, rule = name, count = produced.len(), "规则产生告警");
            }
            for alert in produced {
                if seen.insert(alert.id.clone()) {
                    alerts.push(alert);
                }
            }
        }

        debug!(
            plan_id = %input.plan_id,
            lines = input.lines.len(),
            distributions = input.distributions.len(),
            alerts = alerts.len(),
            "告警评估完成"
        );

        PlanAlertReport::new(alerts)
    }
}
