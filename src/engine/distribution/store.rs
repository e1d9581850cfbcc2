use crate::domain::distribution::NewBudgetDistribution;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// DistributionStore Trait
// ==========================================
// 用途: 分配树构建所需的存储接口 (删除 + 批量插入)
// 实现者: BudgetDistributionRepository
#[async_trait]
pub trait DistributionStore: Send + Sync {
    /// 删除计划下全部分配节点
    async fn delete_by_plan(&self, plan_id: &str) -> RepositoryResult<usize>;

    /// 批量插入节点
    ///
    /// # 返回
    /// - 存储生成的 distribution_id, 顺序与输入一致
    async fn insert_batch(&self, rows: &[NewBudgetDistribution]) -> RepositoryResult<Vec<String>>;
}
