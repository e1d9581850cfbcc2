use crate::domain::hierarchy::HierarchyOrder;
use crate::domain::plan::MediaPlan;
use crate::repository::codec::{date_to_sql, datetime_to_sql, get_datetime, get_opt_date};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// MediaPlanRepository - 媒体计划仓储
// ==========================================
// 本核心只读取计划的标量字段; 写入仅用于建计划/层级变更/版本恢复
pub struct MediaPlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MediaPlanRepository {
    /// 创建新的MediaPlanRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建计划
    ///
    /// # 返回
    /// - `Ok(plan_id)`: 成功
    /// - `Err`: 数据库错误
    pub fn create(&self, plan: &MediaPlan) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO media_plan (
                plan_id, plan_name, total_budget, start_date, end_date,
                hierarchy_order_json, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &plan.plan_id,
                &plan.plan_name,
                &plan.total_budget,
                date_to_sql(plan.start_date),
                date_to_sql(plan.end_date),
                plan.hierarchy_order.to_json(),
                &plan.created_by,
                datetime_to_sql(plan.created_at),
                datetime_to_sql(plan.updated_at),
            ],
        )?;

        Ok(plan.plan_id.clone())
    }

    /// 按plan_id查询计划
    ///
    /// # 返回
    /// - `Ok(Some(MediaPlan))`: 找到计划
    /// - `Ok(None)`: 未找到
    /// - `Err`: 数据库错误 (含层级配置无法解析)
    pub fn find_by_id(&self, plan_id: &str) -> RepositoryResult<Option<MediaPlan>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT plan_id, plan_name, total_budget, start_date, end_date,
                      hierarchy_order_json, created_by, created_at, updated_at
               FROM media_plan
               WHERE plan_id = ?"#,
            params![plan_id],
            |row| self.map_row(row),
        ) {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 更新层级顺序
    pub fn update_hierarchy_order(
        &self,
        plan_id: &str,
        order: &HierarchyOrder,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"UPDATE media_plan
               SET hierarchy_order_json = ?, updated_at = ?
               WHERE plan_id = ?"#,
            params![
                order.to_json(),
                datetime_to_sql(chrono::Local::now().naive_local()),
                plan_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MediaPlan".to_string(),
                id: plan_id.to_string(),
            });
        }
        Ok(())
    }

    /// 覆盖预算相关标量字段 (版本恢复使用)
    pub fn update_budget_fields(
        &self,
        plan_id: &str,
        total_budget: f64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        order: &HierarchyOrder,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"UPDATE media_plan
               SET total_budget = ?, start_date = ?, end_date = ?,
                   hierarchy_order_json = ?, updated_at = ?
               WHERE plan_id = ?"#,
            params![
                total_budget,
                date_to_sql(start_date),
                date_to_sql(end_date),
                order.to_json(),
                datetime_to_sql(chrono::Local::now().naive_local()),
                plan_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MediaPlan".to_string(),
                id: plan_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除计划 (级联删除投放行/分配树/版本)
    pub fn delete(&self, plan_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM media_plan WHERE plan_id = ?", params![plan_id])?;
        Ok(())
    }

    /// 映射数据库行到MediaPlan对象
    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<MediaPlan> {
        let order_json: String = row.get(5)?;
        let hierarchy_order = HierarchyOrder::from_json(&order_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
        })?;

        Ok(MediaPlan {
            plan_id: row.get(0)?,
            plan_name: row.get(1)?,
            total_budget: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
            start_date: get_opt_date(row, 3)?,
            end_date: get_opt_date(row, 4)?,
            hierarchy_order,
            created_by: row.get(6)?,
            created_at: get_datetime(row, 7)?,
            updated_at: get_datetime(row, 8)?,
        })
    }
}
