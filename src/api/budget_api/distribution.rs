use super::*;

impl BudgetApi {
    // ==========================================
    // 分配树接口
    // ==========================================

    /// 按当前层级顺序全量重建分配树
    pub async fn rebuild_distributions(
        &self,
        plan_id: &str,
        operator: &str,
    ) -> ApiResult<DistributionBuildResult> {
        let plan = self.load_plan(plan_id)?;
        let order = plan.hierarchy_order.clone();
        self.rebuild_with_order(&plan, &order, operator).await
    }

    /// 预览分配树 (不写入)
    pub fn preview_distributions(&self, plan_id: &str) -> ApiResult<DistributionPlan> {
        let plan = self.load_plan(plan_id)?;
        let lines = self.repos.line_repo.find_by_plan(plan_id)?;
        Ok(plan_distribution_tree(
            &plan.hierarchy_order,
            &lines,
            plan.total_budget,
        ))
    }

    /// 查询计划下已持久化的分配节点
    pub fn list_distributions(&self, plan_id: &str) -> ApiResult<Vec<BudgetDistribution>> {
        Ok(self.repos.distribution_repo.find_by_plan(plan_id)?)
    }

    /// 已有分配树是否与当前层级顺序不一致 (需要重建)
    pub fn is_distribution_stale(&self, plan_id: &str) -> ApiResult<bool> {
        let plan = self.load_plan(plan_id)?;
        let distributions = self.repos.distribution_repo.find_by_plan(plan_id)?;
        let lines = self.repos.line_repo.find_by_plan(plan_id)?;
        Ok(plan
            .hierarchy_order
            .is_stale_for(&distributions, lines.len()))
    }
}
