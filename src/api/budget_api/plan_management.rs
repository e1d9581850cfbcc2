use super::*;

impl BudgetApi {
    // ==========================================
    // 计划管理接口
    // ==========================================

    /// 创建媒体计划
    ///
    /// # 参数
    /// - plan_name: 计划名称
    /// - total_budget: 计划总预算 (>= 0)
    /// - start_date / end_date: 计划起止日期 (可空)
    /// - created_by: 创建人
    ///
    /// # 返回
    /// - Ok(String): 计划ID
    /// - Err(ApiError): API错误
    pub fn create_plan(
        &self,
        plan_name: &str,
        total_budget: f64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        created_by: &str,
    ) -> ApiResult<String> {
        // 参数验证
        if plan_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("计划名称不能为空".to_string()));
        }
        if created_by.trim().is_empty() {
            return Err(ApiError::InvalidInput("创建人不能为空".to_string()));
        }
        if !total_budget.is_finite() || total_budget < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "计划总预算必须为非负数: {}",
                total_budget
            )));
        }
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(ApiError::InvalidInput(format!(
                    "计划开始日期{}晚于结束日期{}",
                    start, end
                )));
            }
        }

        let now = chrono::Local::now().naive_local();
        let plan = MediaPlan {
            plan_id: uuid::Uuid::new_v4().to_string(),
            plan_name: plan_name.to_string(),
            total_budget,
            start_date,
            end_date,
            hierarchy_order: HierarchyOrder::empty(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };

        let plan_id = self.repos.plan_repo.create(&plan)?;
        info!(plan_id = %plan_id, total_budget = total_budget, "创建媒体计划");
        Ok(plan_id)
    }

    /// 查询计划详情
    pub fn get_plan(&self, plan_id: &str) -> ApiResult<MediaPlan> {
        self.load_plan(plan_id)
    }

    /// 录入投放行
    ///
    /// 投放行必须属于该计划; 录入后不自动重建分配树
    pub fn add_lines(&self, plan_id: &str, lines: &[MediaLine]) -> ApiResult<usize> {
        self.load_plan(plan_id)?;

        if let Some(line) = lines.iter().find(|l| l.plan_id != plan_id) {
            return Err(ApiError::InvalidInput(format!(
                "投放行{}不属于计划{}",
                line.line_id, plan_id
            )));
        }
        if let Some(line) = lines.iter().find(|l| !l.budget.is_finite() || l.budget < 0.0) {
            return Err(ApiError::InvalidInput(format!(
                "投放行{}预算必须为非负数",
                line.line_id
            )));
        }

        Ok(self.repos.line_repo.batch_insert(lines)?)
    }

    /// 查询计划下的投放行
    pub fn list_lines(&self, plan_id: &str) -> ApiResult<Vec<MediaLine>> {
        Ok(self.repos.line_repo.find_by_plan(plan_id)?)
    }

    // ==========================================
    // 层级配置接口
    // ==========================================

    /// 变更计划层级顺序并重建分配树
    ///
    /// # 流程
    /// 1. 在当前顺序上应用变更 (非法变更直接拒绝, 不触碰存储)
    /// 2. 持久化新顺序
    /// 3. 全量重建分配树
    /// 4. 记录层级变更日志
    ///
    /// # 返回
    /// - Ok(DistributionBuildResult): 重建结果 (success=false 时由调用方决定是否重试)
    /// - Err(ApiError::HierarchyConfig): 变更非法
    pub async fn update_hierarchy(
        &self,
        plan_id: &str,
        change: HierarchyChange,
        operator: &str,
    ) -> ApiResult<DistributionBuildResult> {
        let plan = self.load_plan(plan_id)?;
        let new_order = change.apply(&plan.hierarchy_order)?;

        self.repos
            .plan_repo
            .update_hierarchy_order(plan_id, &new_order)?;

        self.repos.action_log_repo.insert(&ActionLog::new(
            plan_id,
            ActionType::UpdateHierarchy,
            operator,
            Some(serde_json::json!({
                "change": change,
                "before": plan.hierarchy_order.levels(),
                "after": new_order.levels(),
            })),
            None,
        ))?;

        info!(
            plan_id = %plan_id,
            levels = ?new_order.levels(),
            "层级顺序已更新"
        );

        self.rebuild_with_order(&plan, &new_order, operator).await
    }
}
