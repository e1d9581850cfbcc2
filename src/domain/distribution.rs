// ==========================================
// 媒体计划预算核心 - 预算分配节点领域模型
// ==========================================
// 红线: 节点金额 = 父节点范围内匹配 (层级, reference_id) 的投放行预算之和
// 红线: 节点深度 <= 计划层级数量; 根节点 (parent = None) 对应第一层级
// ==========================================

use crate::domain::types::HierarchyLevel;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// BudgetDistribution - 预算分配节点 (持久化行)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetDistribution {
    pub distribution_id: String,                // 节点ID (存储生成)
    pub plan_id: String,                        // 所属计划
    pub distribution_type: HierarchyLevel,      // 层级维度
    pub reference_id: Option<String>,           // 维度引用 (None = 未分配桶)
    pub parent_distribution_id: Option<String>, // 父节点ID (仅最外层为 None)
    pub amount: f64,                            // 金额
    pub percentage: f64,                        // 占父节点(或计划总额)百分比
    pub start_date: Option<NaiveDate>,          // 开始日期 (仅 moment 层)
    pub end_date: Option<NaiveDate>,            // 结束日期 (仅 moment 层)
    pub created_at: NaiveDateTime,              // 创建时间
}

impl BudgetDistribution {
    /// 是否为未分配桶
    pub fn is_unassigned(&self) -> bool {
        self.reference_id.is_none()
    }

    /// 是否为根节点
    pub fn is_root(&self) -> bool {
        self.parent_distribution_id.is_none()
    }
}

// ==========================================
// NewBudgetDistribution - 待插入节点
// ==========================================
// 不含 distribution_id / created_at, 由存储在插入时生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudgetDistribution {
    pub plan_id: String,
    pub distribution_type: HierarchyLevel,
    pub reference_id: Option<String>,
    pub parent_distribution_id: Option<String>,
    pub amount: f64,
    pub percentage: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// 计算每个节点的深度 (根节点 = 0)
///
/// 父节点缺失 (悬挂引用) 的节点按根节点处理; 出现环时截断
pub fn distribution_depths(distributions: &[BudgetDistribution]) -> HashMap<String, usize> {
    let parents: HashMap<&str, Option<&str>> = distributions
        .iter()
        .map(|d| {
            (
                d.distribution_id.as_str(),
                d.parent_distribution_id.as_deref(),
            )
        })
        .collect();

    let mut depths = HashMap::with_capacity(distributions.len());
    for d in distributions {
        let mut depth = 0;
        let mut cursor = d.parent_distribution_id.as_deref();
        while let Some(parent_id) = cursor {
            if !parents.contains_key(parent_id) || depth > distributions.len() {
                break;
            }
            depth += 1;
            cursor = parents.get(parent_id).copied().flatten();
        }
        depths.insert(d.distribution_id.clone(), depth);
    }
    depths
}

/// 按深度排序 (父节点在前), 用于需要先插入父节点的场景
pub fn sort_by_depth(distributions: &[BudgetDistribution]) -> Vec<BudgetDistribution> {
    let depths = distribution_depths(distributions);
    let mut sorted = distributions.to_vec();
    sorted.sort_by_key(|d| depths.get(&d.distribution_id).copied().unwrap_or(0));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn node(id: &str, parent: Option<&str>) -> BudgetDistribution {
        BudgetDistribution {
            distribution_id: id.to_string(),
            plan_id: "P1".to_string(),
            distribution_type: HierarchyLevel::Subdivision,
            reference_id: Some(format!("ref-{}", id)),
            parent_distribution_id: parent.map(|p| p.to_string()),
            amount: 0.0,
            percentage: 0.0,
            start_date: None,
            end_date: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_distribution_depths() {
        let nodes = vec![
            node("c", Some("b")),
            node("a", None),
            node("b", Some("a")),
            node("orphan", Some("missing")),
        ];
        let depths = distribution_depths(&nodes);
        assert_eq!(depths["a"], 0);
        assert_eq!(depths["b"], 1);
        assert_eq!(depths["c"], 2);
        assert_eq!(depths["orphan"], 0);
    }

    #[test]
    fn test_sort_by_depth_puts_parents_first() {
        let nodes = vec![node("c", Some("b")), node("b", Some("a")), node("a", None)];
        let sorted = sort_by_depth(&nodes);
        let ids: Vec<&str> = sorted.iter().map(|d| d.distribution_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_depths_terminate_on_cycle() {
        let nodes = vec![node("x", Some("y")), node("y", Some("x"))];
        let depths = distribution_depths(&nodes);
        assert_eq!(depths.len(), 2);
    }
}
