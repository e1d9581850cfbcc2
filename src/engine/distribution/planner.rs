use crate::domain::hierarchy::HierarchyOrder;
use crate::domain::line::MediaLine;
use crate::domain::types::HierarchyLevel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// PlannedNode - 规划中的分配节点
// ==========================================
// parent 为父节点在 arena 中的下标 (临时标识), 插入时替换为真实ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedNode {
    pub depth: usize,
    pub parent: Option<usize>,
    pub level: HierarchyLevel,
    pub reference_id: Option<String>,
    pub amount: f64,
    pub percentage: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub line_count: usize,
}

// ==========================================
// DistributionPlan - 分配树规划结果 (arena)
// ==========================================
// 节点按深度排列: 所有深度 k 的节点位于深度 k+1 之前
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionPlan {
    pub nodes: Vec<PlannedNode>,
}

impl DistributionPlan {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 最大深度 + 1 (空树为 0)
    pub fn depth_count(&self) -> usize {
        self.nodes.iter().map(|n| n.depth + 1).max().unwrap_or(0)
    }

    /// 指定深度的节点 (arena 下标, 节点)
    pub fn nodes_at_depth(&self, depth: usize) -> impl Iterator<Item = (usize, &PlannedNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.depth == depth)
    }

    /// 指定节点的直接子节点
    pub fn children_of(&self, index: usize) -> impl Iterator<Item = (usize, &PlannedNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.parent == Some(index))
    }

    /// 根节点金额之和
    pub fn root_amount(&self) -> f64 {
        self.nodes_at_depth(0).map(|(_, n)| n.amount).sum()
    }
}

/// 百分比: 分母为 0 时返回 0
pub fn percent_of(amount: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        amount / denominator * 100.0
    }
}

/// 规划分配树 (纯函数, 不访问存储)
///
/// # 规则
/// 1. 深度 0 按 order[0] 对全部投放行分组, 无值的行归入未分配桶 (None)
/// 2. 深度 k 在每个父分组内按 order[k] 再分组
/// 3. 根节点百分比相对计划总预算, 子节点相对父节点金额
/// 4. 仅 moment 层记录分组内最早开始 / 最晚结束日期
/// 5. 分组顺序: 未分配桶在前, 其余按 reference_id 升序
pub fn plan_distribution_tree(
    order: &HierarchyOrder,
    lines: &[MediaLine],
    total_budget: f64,
) -> DistributionPlan {
    let mut plan = DistributionPlan::default();
    if order.is_empty() {
        return plan;
    }

    // (父节点下标, 父分组内的投放行)
    let mut frontier: Vec<(Option<usize>, Vec<&MediaLine>)> = vec![(None, lines.iter().collect())];

    for (depth, config) in order.configs().iter().enumerate() {
        let level = config.level;
        let mut next_frontier = Vec::new();

        for (parent, scope) in frontier {
            let denominator = match parent {
                Some(idx) => plan.nodes[idx].amount,
                None => total_budget,
            };

            for (reference_id, group) in group_by_reference(level, &scope) {
                let amount: f64 = group.iter().map(|l| l.budget_or_zero()).sum();
                let (start_date, end_date) = if level == HierarchyLevel::Moment {
                    date_span(&group)
                } else {
                    (None, None)
                };

                plan.nodes.push(PlannedNode {
                    depth,
                    parent,
                    level,
                    reference_id,
                    amount,
                    percentage: percent_of(amount, denominator),
                    start_date,
                    end_date,
                    line_count: group.len(),
                });
                next_frontier.push((Some(plan.nodes.len() - 1), group));
            }
        }

        frontier = next_frontier;
    }

    plan
}

fn group_by_reference<'a>(
    level: HierarchyLevel,
    lines: &[&'a MediaLine],
) -> BTreeMap<Option<String>, Vec<&'a MediaLine>> {
    let mut groups: BTreeMap<Option<String>, Vec<&'a MediaLine>> = BTreeMap::new();
    for line in lines {
        groups
            .entry(line.reference_for(level).map(|r| r.to_string()))
            .or_default()
            .push(*line);
    }
    groups
}

fn date_span(lines: &[&MediaLine]) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let start = lines.iter().filter_map(|l| l.start_date).min();
    let end = lines.iter().filter_map(|l| l.end_date).max();
    (start, end)
}
