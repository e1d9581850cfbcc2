// ==========================================
// 媒体计划预算核心 - 预算分配节点数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: parent_distribution_id 自引用, 插入须先父后子
// ==========================================

use crate::domain::distribution::{BudgetDistribution, NewBudgetDistribution};
use crate::engine::distribution::DistributionStore;
use crate::repository::codec::{date_to_sql, datetime_to_sql, get_datetime, get_level, get_opt_date};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const INSERT_SQL: &str = r#"INSERT INTO budget_distribution (
        distribution_id, plan_id, distribution_type, reference_id,
        parent_distribution_id, amount, percentage, start_date, end_date, created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#;

// ==========================================
// BudgetDistributionRepository - 分配节点仓储
// ==========================================
pub struct BudgetDistributionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BudgetDistributionRepository {
    /// 创建新的BudgetDistributionRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 删除计划下全部分配节点
    ///
    /// # 返回
    /// - `Ok(rows)`: 删除的行数
    pub fn delete_plan_rows(&self, plan_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM budget_distribution WHERE plan_id = ?",
            params![plan_id],
        )?;
        Ok(rows)
    }

    /// 批量插入新节点 (生成 distribution_id)
    ///
    /// # 返回
    /// - `Ok(ids)`: 生成的ID, 与输入顺序一一对应
    pub fn insert_new_rows(&self, rows: &[NewBudgetDistribution]) -> RepositoryResult<Vec<String>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = datetime_to_sql(chrono::Local::now().naive_local());

        let mut ids = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(INSERT_SQL)?;
            for row in rows {
                let distribution_id = uuid::Uuid::new_v4().to_string();
                stmt.execute(params![
                    &distribution_id,
                    &row.plan_id,
                    row.distribution_type.to_db_str(),
                    &row.reference_id,
                    &row.parent_distribution_id,
                    row.amount,
                    row.percentage,
                    date_to_sql(row.start_date),
                    date_to_sql(row.end_date),
                    &now,
                ])?;
                ids.push(distribution_id);
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    /// 按原始ID批量插入节点 (版本恢复使用)
    ///
    /// 调用方需保证父节点排在子节点之前
    pub fn insert_with_ids(&self, rows: &[BudgetDistribution]) -> RepositoryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_SQL)?;
            for row in rows {
                stmt.execute(params![
                    &row.distribution_id,
                    &row.plan_id,
                    row.distribution_type.to_db_str(),
                    &row.reference_id,
                    &row.parent_distribution_id,
                    row.amount,
                    row.percentage,
                    date_to_sql(row.start_date),
                    date_to_sql(row.end_date),
                    datetime_to_sql(row.created_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// 查询计划下全部分配节点
    pub fn find_by_plan(&self, plan_id: &str) -> RepositoryResult<Vec<BudgetDistribution>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT distribution_id, plan_id, distribution_type, reference_id,
                      parent_distribution_id, amount, percentage,
                      start_date, end_date, created_at
               FROM budget_distribution
               WHERE plan_id = ?
               ORDER BY rowid"#,
        )?;

        let rows = stmt
            .query_map(params![plan_id], |row| self.map_row(row))?
            .collect::<Result<Vec<BudgetDistribution>, _>>()?;

        Ok(rows)
    }

    /// 映射数据库行到BudgetDistribution对象
    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<BudgetDistribution> {
        Ok(BudgetDistribution {
            distribution_id: row.get(0)?,
            plan_id: row.get(1)?,
            distribution_type: get_level(row, 2)?,
            reference_id: row.get(3)?,
            parent_distribution_id: row.get(4)?,
            amount: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
            percentage: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
            start_date: get_opt_date(row, 7)?,
            end_date: get_opt_date(row, 8)?,
            created_at: get_datetime(row, 9)?,
        })
    }
}

// ==========================================
// DistributionStore 实现
// ==========================================
// rusqlite 为同步调用, 在调用方运行时上直接执行
#[async_trait]
impl DistributionStore for BudgetDistributionRepository {
    async fn delete_by_plan(&self, plan_id: &str) -> RepositoryResult<usize> {
        self.delete_plan_rows(plan_id)
    }

    async fn insert_batch(&self, rows: &[NewBudgetDistribution]) -> RepositoryResult<Vec<String>> {
        self.insert_new_rows(rows)
    }
}
