use crate::domain::distribution::NewBudgetDistribution;
use crate::domain::hierarchy::HierarchyOrder;
use crate::domain::line::MediaLine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::planner::{plan_distribution_tree, DistributionPlan};
use super::store::DistributionStore;

// ==========================================
// BuildOptions - 构建选项
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// 构建前删除计划下已有节点
    pub replace_existing: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            replace_existing: true,
        }
    }
}

// ==========================================
// DistributionBuildResult - 构建结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionBuildResult {
    /// 是否全部深度插入成功
    pub success: bool,
    /// 已成功插入的节点数
    pub count: usize,
    /// 失败原因
    pub error: Option<String>,
    /// 插入失败的深度 (删除阶段失败时为 None)
    pub failed_depth: Option<usize>,
}

impl DistributionBuildResult {
    fn succeeded(count: usize) -> Self {
        Self {
            success: true,
            count,
            error: None,
            failed_depth: None,
        }
    }

    fn failed(count: usize, error: String, failed_depth: Option<usize>) -> Self {
        Self {
            success: false,
            count,
            error: Some(error),
            failed_depth,
        }
    }
}

// ==========================================
// DistributionTreeBuilder - 分配树构建引擎
// ==========================================
pub struct DistributionTreeBuilder {
    store: Arc<dyn DistributionStore>,
}

impl DistributionTreeBuilder {
    /// 创建新的分配树构建引擎
    pub fn new(store: Arc<dyn DistributionStore>) -> Self {
        Self { store }
    }

    /// 全量重建计划的分配树 (默认选项)
    pub async fn build(
        &self,
        plan_id: &str,
        order: &HierarchyOrder,
        lines: &[MediaLine],
        total_budget: f64,
    ) -> DistributionBuildResult {
        self.build_with_options(plan_id, order, lines, total_budget, BuildOptions::default())
            .await
    }

    /// 重建计划的分配树
    ///
    /// # 流程
    /// 1. (可选) 删除已有节点
    /// 2. 规划节点 arena
    /// 3. 逐深度批量插入, 以父节点真实ID替换 arena 下标
    ///
    /// 任一深度失败立即返回, 已插入的深度保留
    pub async fn build_with_options(
        &self,
        plan_id: &str,
        order: &HierarchyOrder,
        lines: &[MediaLine],
        total_budget: f64,
        options: BuildOptions,
    ) -> DistributionBuildResult {
        info!(
            plan_id = %plan_id,
            levels = order.len(),
            lines = lines.len(),
            total_budget = total_budget,
            "开始构建预算分配树"
        );

        if options.replace_existing {
            match self.store.delete_by_plan(plan_id).await {
                Ok(deleted) => debug!(plan_id = %plan_id, deleted = deleted, "已删除旧分配节点"),
                Err(e) => {
                    warn!(plan_id = %plan_id, error = %e, "删除旧分配节点失败");
                    return DistributionBuildResult::failed(0, e.to_string(), None);
                }
            }
        }

        let plan = plan_distribution_tree(order, lines, total_budget);
        let result = self.insert_plan(plan_id, &plan).await;

        if result.success {
            info!(plan_id = %plan_id, count = result.count, "预算分配树构建完成");
        }
        result
    }

    async fn insert_plan(&self, plan_id: &str, plan: &DistributionPlan) -> DistributionBuildResult {
        // arena 下标 → 真实ID
        let mut real_ids: Vec<Option<String>> = vec![None; plan.len()];
        let mut inserted = 0usize;

        for depth in 0..plan.depth_count() {
            let mut indices = Vec::new();
            let mut rows = Vec::new();

            for (index, node) in plan.nodes_at_depth(depth) {
                let parent_distribution_id = match node.parent {
                    None => None,
                    Some(parent) => match real_ids.get(parent).cloned().flatten() {
                        Some(id) => Some(id),
                        None => {
                            let error = format!("父节点未插入 (arena index={})", parent);
                            warn!(plan_id = %plan_id, depth = depth, "{}", error);
                            return DistributionBuildResult::failed(inserted, error, Some(depth));
                        }
                    },
                };

                indices.push(index);
                rows.push(NewBudgetDistribution {
                    plan_id: plan_id.to_string(),
                    distribution_type: node.level,
                    reference_id: node.reference_id.clone(),
                    parent_distribution_id,
                    amount: node.amount,
                    percentage: node.percentage,
                    start_date: node.start_date,
                    end_date: node.end_date,
                });
            }

            let ids = match self.store.insert_batch(&rows).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(plan_id = %plan_id, depth = depth, error = %e, "分配节点插入失败");
                    return DistributionBuildResult::failed(inserted, e.to_string(), Some(depth));
                }
            };

            if ids.len() != rows.len() {
                let error = format!(
                    "存储返回的ID数量不匹配: expected={}, actual={}",
                    rows.len(),
                    ids.len()
                );
                warn!(plan_id = %plan_id, depth = depth, "{}", error);
                return DistributionBuildResult::failed(inserted, error, Some(depth));
            }

            for (index, id) in indices.into_iter().zip(ids) {
                real_ids[index] = Some(id);
            }
            inserted += rows.len();
            debug!(plan_id = %plan_id, depth = depth, count = rows.len(), "深度插入完成");
        }

        DistributionBuildResult::succeeded(inserted)
    }
}
