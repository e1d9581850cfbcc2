use super::*;

impl BudgetApi {
    // ==========================================
    // 版本管理接口
    // ==========================================

    /// 记录计划当前状态为新版本
    pub fn capture_version(
        &self,
        plan_id: &str,
        note: Option<String>,
        operator: &str,
    ) -> ApiResult<PlanVersion> {
        self.load_plan(plan_id)?;
        Ok(self.replay_engine.capture_version(plan_id, note, operator)?)
    }

    /// 恢复计划到指定版本
    ///
    /// 恢复前后各生成一个版本, 可再次恢复到 before_version_id 撤销本次恢复
    pub fn restore_version(
        &self,
        plan_id: &str,
        version_id: &str,
        operator: &str,
    ) -> ApiResult<RestoreResult> {
        Ok(self.replay_engine.restore_version(plan_id, version_id, operator)?)
    }

    /// 查询计划的版本列表
    pub fn list_versions(&self, plan_id: &str) -> ApiResult<Vec<PlanVersion>> {
        Ok(self.replay_engine.list_versions(plan_id)?)
    }

    /// 查询计划的操作日志 (最近在前)
    pub fn list_action_logs(&self, plan_id: &str, limit: usize) -> ApiResult<Vec<ActionLog>> {
        Ok(self.repos.action_log_repo.find_by_plan(plan_id, limit)?)
    }
}
