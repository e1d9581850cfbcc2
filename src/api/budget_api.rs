// ==========================================
// 媒体计划预算核心 - 预算 API
// ==========================================
// 职责: 计划层级配置、分配树重建、一致性告警、版本快照
// 红线: 层级配置非法时在任何存储交互前拒绝
// 红线: 告警评估只读, 不写入任何表
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{AlertConfigReader, ConfigManager};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::distribution::BudgetDistribution;
use crate::domain::hierarchy::{HierarchyChange, HierarchyOrder};
use crate::domain::line::MediaLine;
use crate::domain::plan::{MediaPlan, PlanVersion};
use crate::engine::alert::{PlanAlertEngine, PlanAlertInput, PlanAlertReport};
use crate::engine::distribution::{
    plan_distribution_tree, DistributionBuildResult, DistributionPlan, DistributionStore,
    DistributionTreeBuilder,
};
use crate::engine::repositories::PlanRepositories;
use crate::engine::snapshot_replay::{RestoreResult, SnapshotReplayEngine};

mod distribution;
mod plan_management;
mod version;

#[cfg(test)]
mod tests;

// ==========================================
// BudgetApi - 预算 API
// ==========================================

/// 预算API
///
/// 职责：
/// 1. 计划管理（创建、查询、录入投放行）
/// 2. 层级配置变更（校验、持久化、重建分配树）
/// 3. 分配树重建与预览
/// 4. 一致性告警评估
/// 5. 版本记录与恢复
pub struct BudgetApi {
    repos: PlanRepositories,
    config_manager: Arc<ConfigManager>,
    tree_builder: DistributionTreeBuilder,
    replay_engine: SnapshotReplayEngine,
}

impl BudgetApi {
    /// 创建新的BudgetApi实例
    pub fn new(repos: PlanRepositories, config_manager: Arc<ConfigManager>) -> Self {
        let store: Arc<dyn DistributionStore> = repos.distribution_repo.clone();
        Self {
            tree_builder: DistributionTreeBuilder::new(store),
            replay_engine: SnapshotReplayEngine::new(repos.clone()),
            repos,
            config_manager,
        }
    }

    /// 加载计划, 不存在时返回 NotFound
    fn load_plan(&self, plan_id: &str) -> ApiResult<MediaPlan> {
        self.repos
            .plan_repo
            .find_by_id(plan_id)?
            .ok_or_else(|| ApiError::NotFound(format!("MediaPlan(id={})不存在", plan_id)))
    }

    /// 重建分配树并记录操作日志
    async fn rebuild_with_order(
        &self,
        plan: &MediaPlan,
        order: &HierarchyOrder,
        operator: &str,
    ) -> ApiResult<DistributionBuildResult> {
        let lines = self.repos.line_repo.find_by_plan(&plan.plan_id)?;

        let result = self
            .tree_builder
            .build(&plan.plan_id, order, &lines, plan.total_budget)
            .await;

        if !result.success {
            warn!(
                plan_id = %plan.plan_id,
                failed_depth = ?result.failed_depth,
                error = ?result.error,
                "分配树重建未完成"
            );
        }

        self.repos.action_log_repo.insert(&ActionLog::new(
            &plan.plan_id,
            ActionType::RebuildDistributions,
            operator,
            Some(serde_json::json!({
                "levels": order.levels(),
                "line_count": lines.len(),
                "success": result.success,
                "count": result.count,
                "failed_depth": result.failed_depth,
            })),
            result.error.clone(),
        ))?;

        Ok(result)
    }

    /// 评估计划一致性告警
    ///
    /// # 参数
    /// - plan_id: 计划ID
    /// - today: 评估日 ("已结束" 判定基准)
    ///
    /// # 说明
    /// - 阈值与文案语言读取自配置表, 缺失时使用默认值
    /// - 只读操作, 不写操作日志
    pub async fn evaluate_alerts(
        &self,
        plan_id: &str,
        today: NaiveDate,
    ) -> ApiResult<PlanAlertReport> {
        let plan = self.load_plan(plan_id)?;

        let thresholds = self
            .config_manager
            .get_alert_thresholds()
            .await
            .map_err(|e| ApiError::InternalError(format!("读取告警阈值失败: {}", e)))?;
        let locale = self
            .config_manager
            .get_locale()
            .await
            .map_err(|e| ApiError::InternalError(format!("读取语言配置失败: {}", e)))?;

        let input = PlanAlertInput {
            plan_id: plan.plan_id.clone(),
            total_budget: plan.total_budget,
            lines: self.repos.line_repo.find_by_plan(plan_id)?,
            creatives_by_line: self.repos.asset_repo.find_creatives_by_plan(plan_id)?,
            distributions: self.repos.distribution_repo.find_by_plan(plan_id)?,
            monthly_budgets_by_line: self.repos.asset_repo.find_monthly_budgets_by_plan(plan_id)?,
            plan_start_date: plan.start_date,
            plan_end_date: plan.end_date,
            moments: self.repos.asset_repo.find_moments_by_plan(plan_id)?,
            hierarchy_order: plan.hierarchy_order.clone(),
            today,
            locale,
        };

        let report = PlanAlertEngine::with_thresholds(thresholds).evaluate(&input);

        info!(
            plan_id = %plan_id,
            total = report.len(),
            errors = report.error_count(),
            warnings = report.warning_count(),
            "告警评估完成"
        );

        Ok(report)
    }
}
