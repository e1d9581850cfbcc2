use crate::domain::alert::PlanAlert;
use crate::domain::distribution::BudgetDistribution;
use crate::domain::line::MediaLine;
use crate::domain::types::{AlertCategory, AlertLevel, HierarchyLevel};
use crate::i18n::t_with_args_in;
use std::collections::HashMap;

use super::core::{AlertThresholds, PlanAlertInput};

// ==========================================
// 规则注册表
// ==========================================
// 每条规则独立求值, 返回 0..n 条告警; 执行顺序即输出顺序

/// 告警规则函数
pub type AlertRule = fn(&RuleContext<'_>) -> Vec<PlanAlert>;

/// 已注册规则 (名称, 规则函数)
pub const ALERT_RULES: &[(&str, AlertRule)] = &[
    ("plan_overage", plan_overage),
    ("node_overage", node_overage),
    ("empty_allocation", empty_allocation),
    ("allocation_over_total", allocation_over_total),
    ("orphaned_moment", orphaned_moment),
    ("concentration", concentration),
    ("underutilization", underutilization),
    ("creatives", creatives),
    ("utm", utm),
    ("plan_bounds", plan_bounds),
    ("line_ended", line_ended),
    ("missing_dates", missing_dates),
    ("zero_budget", zero_budget),
    ("monthly_mismatch", monthly_mismatch),
    ("unassigned_line", unassigned_line),
    ("outside_moment", outside_moment),
];

// ==========================================
// RuleContext - 规则求值上下文
// ==========================================
pub struct RuleContext<'a> {
    pub input: &'a PlanAlertInput,
    pub thresholds: &'a AlertThresholds,
    /// 全部投放行预算之和
    pub allocated: f64,
    /// distribution_id -> 节点
    nodes_by_id: HashMap<&'a str, &'a BudgetDistribution>,
}

impl<'a> RuleContext<'a> {
    pub fn new(input: &'a PlanAlertInput, thresholds: &'a AlertThresholds) -> Self {
        let allocated = input.lines.iter().map(|l| l.budget_or_zero()).sum();
        let nodes_by_id = input
            .distributions
            .iter()
            .map(|d| (d.distribution_id.as_str(), d))
            .collect();
        Self {
            input,
            thresholds,
            allocated,
            nodes_by_id,
        }
    }

    fn eps(&self) -> f64 {
        self.thresholds.money_epsilon
    }

    fn total(&self) -> f64 {
        if self.input.total_budget.is_finite() {
            self.input.total_budget
        } else {
            0.0
        }
    }

    /// 已配置层级上的分配节点
    fn configured_nodes(&self) -> impl Iterator<Item = &'a BudgetDistribution> + '_ {
        self.input
            .distributions
            .iter()
            .filter(move |d| self.input.hierarchy_order.contains(d.distribution_type))
    }

    /// 节点自身及其全部祖先 (自下而上)
    ///
    /// 父节点缺失时止于当前节点; 最多追溯节点总数步
    fn scope_chain(&self, node: &'a BudgetDistribution) -> Vec<&'a BudgetDistribution> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent_id) = current.parent_distribution_id.as_deref() {
            if chain.len() > self.input.distributions.len() {
                break;
            }
            let Some(parent) = self.nodes_by_id.get(parent_id).copied() else {
                break;
            };
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// 落在节点范围内的投放行: 节点及每个祖先的 (层级, reference_id) 均匹配
    ///
    /// reference_id 为 None 时匹配该层级无值的投放行
    fn matching_lines(&self, node: &'a BudgetDistribution) -> Vec<&'a MediaLine> {
        let chain = self.scope_chain(node);
        self.input
            .lines
            .iter()
            .filter(|l| {
                chain
                    .iter()
                    .all(|d| l.reference_for(d.distribution_type) == d.reference_id.as_deref())
            })
            .collect()
    }
}

// ==========================================
// 文本与格式化
// ==========================================

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn pct(value: f64) -> String {
    format!("{:.1}", value)
}

impl RuleContext<'_> {
    fn text(&self, key: &str, args: &[(&str, &str)]) -> String {
        t_with_args_in(&self.input.locale, key, args)
    }

    fn level_name(&self, level: HierarchyLevel) -> String {
        self.text(&format!("level.{}", level.to_db_str()), &[])
    }

    fn build_alert(
        &self,
        id: String,
        level: AlertLevel,
        category: AlertCategory,
        kind: &str,
        args: &[(&str, &str)],
    ) -> PlanAlert {
        self.build_alert_with_action(id, level, category, kind, "action", args)
    }

    fn build_alert_with_action(
        &self,
        id: String,
        level: AlertLevel,
        category: AlertCategory,
        kind: &str,
        action_key: &str,
        args: &[(&str, &str)],
    ) -> PlanAlert {
        PlanAlert::new(
            id,
            level,
            category,
            self.text(&format!("alert.{}.title", kind), args),
            self.text(&format!("alert.{}.description", kind), args),
            self.text(&format!("alert.{}.{}", kind, action_key), args),
        )
    }
}

// ==========================================
// 预算规则
// ==========================================

/// 计划级超支: 投放行合计 > 总预算
fn plan_overage(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let total = ctx.total();
    let excess = ctx.allocated - total;
    if total <= 0.0 || excess <= ctx.eps() {
        return Vec::new();
    }

    let percentage = excess / total * 100.0;
    vec![ctx.build_alert(
        format!("budget-overage-{}", ctx.input.plan_id),
        AlertLevel::Error,
        AlertCategory::Budget,
        "budget_overage",
        &[
            ("allocated", &money(ctx.allocated)),
            ("total", &money(total)),
            ("excess", &money(excess)),
            ("percentage", &pct(percentage)),
        ],
    )
    .with_amount(excess)
    .with_percentage(percentage)]
}

/// 节点超支: 匹配投放行合计 > 节点金额
fn node_overage(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let mut alerts = Vec::new();

    for node in ctx.configured_nodes() {
        if node.amount <= 0.0 {
            continue;
        }
        let actual: f64 = ctx
            .matching_lines(node)
            .iter()
            .map(|l| l.budget_or_zero())
            .sum();
        let excess = actual - node.amount;
        if excess <= ctx.eps() {
            continue;
        }

        let level = ctx.level_name(node.distribution_type);
        let reference = node.reference_id.clone().unwrap_or_default();
        alerts.push(
            ctx.build_alert(
                format!("node-overage-{}", node.distribution_id),
                AlertLevel::Warning,
                AlertCategory::Budget,
                "node_overage",
                &[
                    ("level", &level),
                    ("reference", &reference),
                    ("actual", &money(actual)),
                    ("amount", &money(node.amount)),
                    ("excess", &money(excess)),
                ],
            )
            .with_amount(excess),
        );
    }

    alerts
}

/// 空分配: 有金额但无任何匹配投放行 (moment 层为 warning)
fn empty_allocation(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let mut alerts = Vec::new();

    for node in ctx.configured_nodes() {
        let Some(reference) = node.reference_id.as_deref() else {
            continue;
        };
        if node.amount <= 0.0 || !ctx.matching_lines(node).is_empty() {
            continue;
        }

        let level = if node.distribution_type == HierarchyLevel::Moment {
            AlertLevel::Warning
        } else {
            AlertLevel::Info
        };
        alerts.push(
            ctx.build_alert(
                format!("empty-allocation-{}", node.distribution_id),
                level,
                AlertCategory::Budget,
                "empty_allocation",
                &[
                    ("level", &ctx.level_name(node.distribution_type)),
                    ("reference", reference),
                    ("amount", &money(node.amount)),
                ],
            )
            .with_amount(node.amount),
        );
    }

    alerts
}

/// 声明分配超出计划总额: 最外层 allocate_budget 层级
fn allocation_over_total(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let total = ctx.total();
    if total <= 0.0 {
        return Vec::new();
    }
    let Some(config) = ctx
        .input
        .hierarchy_order
        .configs()
        .iter()
        .find(|c| c.allocate_budget)
    else {
        return Vec::new();
    };

    let declared: f64 = ctx
        .input
        .distributions
        .iter()
        .filter(|d| d.distribution_type == config.level)
        .map(|d| d.amount)
        .sum();
    let excess = declared - total;
    if excess <= ctx.eps() {
        return Vec::new();
    }

    vec![ctx.build_alert(
        format!("allocation-over-total-{}", ctx.input.plan_id),
        AlertLevel::Warning,
        AlertCategory::Budget,
        "allocation_over_total",
        &[
            ("level", &ctx.level_name(config.level)),
            ("declared", &money(declared)),
            ("total", &money(total)),
            ("excess", &money(excess)),
        ],
    )
    .with_amount(excess)]
}

/// 时段分配引用了不存在的时段 (仅在提供时段列表时判定)
fn orphaned_moment(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    if ctx.input.moments.is_empty() {
        return Vec::new();
    }

    ctx.configured_nodes()
        .filter(|d| d.distribution_type == HierarchyLevel::Moment)
        .filter_map(|d| {
            let reference = d.reference_id.as_deref()?;
            if ctx.input.moments.iter().any(|m| m.moment_id == reference) {
                return None;
            }
            Some(ctx.build_alert(
                format!("orphaned-moment-{}", d.distribution_id),
                AlertLevel::Warning,
                AlertCategory::Config,
                "orphaned_moment",
                &[("reference", reference)],
            ))
        })
        .collect()
}

/// 预算集中: 单行占比超过阈值 (至少两行)
fn concentration(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let total = ctx.total();
    if ctx.input.lines.len() <= 1 || total <= 0.0 {
        return Vec::new();
    }

    ctx.input
        .lines
        .iter()
        .filter_map(|line| {
            let ratio = line.budget_or_zero() / total;
            if ratio <= ctx.thresholds.concentration_ratio {
                return None;
            }
            let percentage = ratio * 100.0;
            Some(
                ctx.build_alert(
                    format!("concentration-{}", line.line_id),
                    AlertLevel::Warning,
                    AlertCategory::Budget,
                    "concentration",
                    &[("line", line.display_name()), ("percentage", &pct(percentage))],
                )
                .with_line(&line.line_id)
                .with_amount(line.budget_or_zero())
                .with_percentage(percentage),
            )
        })
        .collect()
}

/// 未充分使用: 已分配/总预算 低于阈值
fn underutilization(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let total = ctx.total();
    if ctx.input.lines.is_empty() || total <= 0.0 {
        return Vec::new();
    }
    if ctx.allocated / total >= ctx.thresholds.underutilization_ratio {
        return Vec::new();
    }

    let remaining = total - ctx.allocated;
    let percentage = ctx.allocated / total * 100.0;
    vec![ctx.build_alert(
        format!("underutilized-{}", ctx.input.plan_id),
        AlertLevel::Info,
        AlertCategory::Budget,
        "underutilized",
        &[
            ("allocated", &money(ctx.allocated)),
            ("percentage", &pct(percentage)),
            ("remaining", &money(remaining)),
        ],
    )
    .with_amount(remaining)
    .with_percentage(percentage)]
}

// ==========================================
// 投放行规则
// ==========================================

/// 素材: 无素材 (warning) / 素材缺少格式 (info, 每个素材一条)
fn creatives(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let mut alerts = Vec::new();

    for line in &ctx.input.lines {
        let creatives = ctx
            .input
            .creatives_by_line
            .get(&line.line_id)
            .map(|c| c.as_slice())
            .unwrap_or(&[]);

        if creatives.is_empty() {
            alerts.push(
                ctx.build_alert(
                    format!("no-creatives-{}", line.line_id),
                    AlertLevel::Warning,
                    AlertCategory::Creative,
                    "no_creatives",
                    &[("line", line.display_name())],
                )
                .with_line(&line.line_id),
            );
            continue;
        }

        for creative in creatives {
            let has_format = creative
                .format_id
                .as_deref()
                .is_some_and(|f| !f.trim().is_empty());
            if has_format {
                continue;
            }
            alerts.push(
                ctx.build_alert(
                    format!("creative-no-format-{}", creative.creative_id),
                    AlertLevel::Info,
                    AlertCategory::Creative,
                    "creative_no_format",
                    &[
                        ("creative", &creative.creative_name),
                        ("line", line.display_name()),
                    ],
                )
                .with_line(&line.line_id),
            );
        }
    }

    alerts
}

/// UTM: 未设置 / 已设置未验证 (互斥)
fn utm(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    ctx.input
        .lines
        .iter()
        .filter_map(|line| {
            let (id, kind) = if !line.has_any_utm() {
                (format!("no-utm-{}", line.line_id), "no_utm")
            } else if !line.utm_validated {
                (format!("utm-not-validated-{}", line.line_id), "utm_not_validated")
            } else {
                return None;
            };
            Some(
                ctx.build_alert(
                    id,
                    AlertLevel::Info,
                    AlertCategory::Utm,
                    kind,
                    &[("line", line.display_name())],
                )
                .with_line(&line.line_id),
            )
        })
        .collect()
}

/// 投放行日期超出计划起止 (每个越界方向一条)
fn plan_bounds(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let mut alerts = Vec::new();

    for line in &ctx.input.lines {
        if let (Some(plan_start), Some(line_start)) = (ctx.input.plan_start_date, line.start_date) {
            if line_start < plan_start {
                alerts.push(
                    ctx.build_alert(
                        format!("starts-before-plan-{}", line.line_id),
                        AlertLevel::Warning,
                        AlertCategory::Timing,
                        "starts_before_plan",
                        &[
                            ("line", line.display_name()),
                            ("line_date", &line_start.to_string()),
                            ("plan_date", &plan_start.to_string()),
                        ],
                    )
                    .with_line(&line.line_id),
                );
            }
        }

        if let (Some(plan_end), Some(line_end)) = (ctx.input.plan_end_date, line.end_date) {
            if line_end > plan_end {
                alerts.push(
                    ctx.build_alert(
                        format!("ends-after-plan-{}", line.line_id),
                        AlertLevel::Warning,
                        AlertCategory::Timing,
                        "ends_after_plan",
                        &[
                            ("line", line.display_name()),
                            ("line_date", &line_end.to_string()),
                            ("plan_date", &plan_end.to_string()),
                        ],
                    )
                    .with_line(&line.line_id),
                );
            }
        }
    }

    alerts
}

/// 已结束但仍有预算
fn line_ended(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    ctx.input
        .lines
        .iter()
        .filter_map(|line| {
            let end_date = line.end_date?;
            if end_date >= ctx.input.today || line.budget_or_zero() <= 0.0 {
                return None;
            }
            Some(
                ctx.build_alert(
                    format!("line-ended-{}", line.line_id),
                    AlertLevel::Info,
                    AlertCategory::Timing,
                    "line_ended",
                    &[
                        ("line", line.display_name()),
                        ("end_date", &end_date.to_string()),
                        ("budget", &money(line.budget_or_zero())),
                    ],
                )
                .with_line(&line.line_id)
                .with_amount(line.budget_or_zero()),
            )
        })
        .collect()
}

/// 缺少开始或结束日期
fn missing_dates(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    ctx.input
        .lines
        .iter()
        .filter(|line| line.start_date.is_none() || line.end_date.is_none())
        .map(|line| {
            ctx.build_alert(
                format!("missing-dates-{}", line.line_id),
                AlertLevel::Info,
                AlertCategory::Timing,
                "missing_dates",
                &[("line", line.display_name())],
            )
            .with_line(&line.line_id)
        })
        .collect()
}

/// 零预算
fn zero_budget(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    ctx.input
        .lines
        .iter()
        .filter(|line| line.budget_or_zero().abs() < ctx.eps())
        .map(|line| {
            ctx.build_alert(
                format!("zero-budget-{}", line.line_id),
                AlertLevel::Warning,
                AlertCategory::Budget,
                "zero_budget",
                &[("line", line.display_name())],
            )
            .with_line(&line.line_id)
        })
        .collect()
}

/// 投放行预算与月度分配合计不一致 (仅对有月度分配的行)
fn monthly_mismatch(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let mut alerts = Vec::new();

    for line in &ctx.input.lines {
        let Some(months) = ctx.input.monthly_budgets_by_line.get(&line.line_id) else {
            continue;
        };
        if months.is_empty() {
            continue;
        }

        let monthly: f64 = months
            .iter()
            .map(|m| if m.amount.is_finite() { m.amount } else { 0.0 })
            .sum();
        let diff = line.budget_or_zero() - monthly;
        if diff.abs() <= ctx.eps() {
            continue;
        }

        let action_key = if diff > 0.0 {
            "action_distribute"
        } else {
            "action_reduce"
        };
        alerts.push(
            ctx.build_alert_with_action(
                format!("monthly-mismatch-{}", line.line_id),
                AlertLevel::Error,
                AlertCategory::Budget,
                "monthly_mismatch",
                action_key,
                &[
                    ("line", line.display_name()),
                    ("budget", &money(line.budget_or_zero())),
                    ("monthly", &money(monthly)),
                    ("diff", &money(diff.abs())),
                ],
            )
            .with_line(&line.line_id)
            .with_amount(diff.abs()),
        );
    }

    alerts
}

// ==========================================
// 配置规则
// ==========================================

/// 投放行缺少 allocate_budget 层级的维度值
fn unassigned_line(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let mut alerts = Vec::new();

    for config in ctx.input.hierarchy_order.configs() {
        if !config.allocate_budget {
            continue;
        }
        let level = ctx.level_name(config.level);
        for line in &ctx.input.lines {
            if line.reference_for(config.level).is_some() {
                continue;
            }
            alerts.push(
                ctx.build_alert(
                    format!("unassigned-{}-{}", config.level.to_db_str(), line.line_id),
                    AlertLevel::Info,
                    AlertCategory::Config,
                    "unassigned_line",
                    &[("line", line.display_name()), ("level", &level)],
                )
                .with_line(&line.line_id),
            );
        }
    }

    alerts
}

/// 投放行日期超出所属时段范围
fn outside_moment(ctx: &RuleContext<'_>) -> Vec<PlanAlert> {
    let moments: HashMap<&str, _> = ctx
        .input
        .moments
        .iter()
        .map(|m| (m.moment_id.as_str(), m))
        .collect();

    ctx.input
        .lines
        .iter()
        .filter_map(|line| {
            let moment = moments.get(line.reference_for(HierarchyLevel::Moment)?)?;
            let starts_early = matches!(
                (line.start_date, moment.start_date),
                (Some(l), Some(m)) if l < m
            );
            let ends_late = matches!(
                (line.end_date, moment.end_date),
                (Some(l), Some(m)) if l > m
            );
            if !starts_early && !ends_late {
                return None;
            }

            let fmt_date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
            Some(
                ctx.build_alert(
                    format!("outside-moment-{}", line.line_id),
                    AlertLevel::Info,
                    AlertCategory::Timing,
                    "outside_moment",
                    &[
                        ("line", line.display_name()),
                        ("moment", &moment.moment_name),
                        ("moment_start", &fmt_date(moment.start_date)),
                        ("moment_end", &fmt_date(moment.end_date)),
                    ],
                )
                .with_line(&line.line_id),
            )
        })
        .collect()
}
