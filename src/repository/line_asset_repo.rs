// ==========================================
// 媒体计划预算核心 - 投放行附属数据仓储
// ==========================================
// 素材 / 月度预算 / 时段: 告警引擎的辅助输入
// ==========================================

use crate::domain::line::{Creative, Moment, MonthlyBudget};
use crate::repository::codec::{date_to_sql, get_date, get_opt_date, DATE_FMT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// LineAssetRepository - 附属数据仓储
// ==========================================
pub struct LineAssetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LineAssetRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 素材
    // ==========================================

    pub fn insert_creative(&self, creative: &Creative) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO line_creative (creative_id, line_id, creative_name, format_id)
               VALUES (?, ?, ?, ?)"#,
            params![
                &creative.creative_id,
                &creative.line_id,
                &creative.creative_name,
                &creative.format_id,
            ],
        )?;
        Ok(())
    }

    /// 查询计划下全部素材, 按 line_id 分组
    pub fn find_creatives_by_plan(
        &self,
        plan_id: &str,
    ) -> RepositoryResult<HashMap<String, Vec<Creative>>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT c.creative_id, c.line_id, c.creative_name, c.format_id
               FROM line_creative c
               JOIN media_line l ON l.line_id = c.line_id
               WHERE l.plan_id = ?
               ORDER BY c.line_id, c.creative_id"#,
        )?;

        let rows = stmt
            .query_map(params![plan_id], |row| {
                Ok(Creative {
                    creative_id: row.get(0)?,
                    line_id: row.get(1)?,
                    creative_name: row.get(2)?,
                    format_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<Creative>, _>>()?;

        let mut by_line: HashMap<String, Vec<Creative>> = HashMap::new();
        for creative in rows {
            by_line
                .entry(creative.line_id.clone())
                .or_default()
                .push(creative);
        }
        Ok(by_line)
    }

    // ==========================================
    // 月度预算
    // ==========================================

    /// 批量写入月度预算 (同一行同一月份覆盖)
    pub fn upsert_monthly_budgets(&self, budgets: &[MonthlyBudget]) -> RepositoryResult<usize> {
        if budgets.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO line_monthly_budget (line_id, month, amount)
                   VALUES (?1, ?2, ?3)
                   ON CONFLICT(line_id, month) DO UPDATE SET amount = ?3"#,
            )?;
            for b in budgets {
                stmt.execute(params![&b.line_id, b.month.format(DATE_FMT).to_string(), b.amount])?;
            }
        }
        tx.commit()?;
        Ok(budgets.len())
    }

    /// 查询计划下全部月度预算, 按 line_id 分组
    pub fn find_monthly_budgets_by_plan(
        &self,
        plan_id: &str,
    ) -> RepositoryResult<HashMap<String, Vec<MonthlyBudget>>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT m.line_id, m.month, m.amount
               FROM line_monthly_budget m
               JOIN media_line l ON l.line_id = m.line_id
               WHERE l.plan_id = ?
               ORDER BY m.line_id, m.month"#,
        )?;

        let rows = stmt
            .query_map(params![plan_id], |row| {
                Ok(MonthlyBudget {
                    line_id: row.get(0)?,
                    month: get_date(row, 1)?,
                    amount: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                })
            })?
            .collect::<Result<Vec<MonthlyBudget>, _>>()?;

        let mut by_line: HashMap<String, Vec<MonthlyBudget>> = HashMap::new();
        for budget in rows {
            by_line.entry(budget.line_id.clone()).or_default().push(budget);
        }
        Ok(by_line)
    }

    // ==========================================
    // 时段
    // ==========================================

    pub fn insert_moment(&self, moment: &Moment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO plan_moment (moment_id, plan_id, moment_name, start_date, end_date)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &moment.moment_id,
                &moment.plan_id,
                &moment.moment_name,
                date_to_sql(moment.start_date),
                date_to_sql(moment.end_date),
            ],
        )?;
        Ok(())
    }

    pub fn find_moments_by_plan(&self, plan_id: &str) -> RepositoryResult<Vec<Moment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT moment_id, plan_id, moment_name, start_date, end_date
               FROM plan_moment
               WHERE plan_id = ?
               ORDER BY start_date, moment_id"#,
        )?;

        let moments = stmt
            .query_map(params![plan_id], |row| {
                Ok(Moment {
                    moment_id: row.get(0)?,
                    plan_id: row.get(1)?,
                    moment_name: row.get(2)?,
                    start_date: get_opt_date(row, 3)?,
                    end_date: get_opt_date(row, 4)?,
                })
            })?
            .collect::<Result<Vec<Moment>, _>>()?;

        Ok(moments)
    }
}
