// ==========================================
// 媒体计划预算核心 - 投放行数据仓储
// ==========================================
// 本核心视角下投放行只读; 写入仅用于建数与版本恢复 (保留原始ID)
// ==========================================

use crate::domain::line::MediaLine;
use crate::repository::codec::{date_to_sql, get_opt_date};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const LINE_COLUMNS: &str = r#"line_id, plan_id, line_name, budget,
       subdivision_id, moment_id, funnel_stage_id,
       start_date, end_date,
       utm_source, utm_medium, utm_campaign, utm_content, utm_term, utm_validated"#;

// ==========================================
// MediaLineRepository - 投放行仓储
// ==========================================
pub struct MediaLineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MediaLineRepository {
    /// 创建新的MediaLineRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量插入投放行 (使用传入的 line_id)
    ///
    /// # 返回
    /// - `Ok(count)`: 插入的记录数
    pub fn batch_insert(&self, lines: &[MediaLine]) -> RepositoryResult<usize> {
        if lines.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO media_line ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                LINE_COLUMNS
            ))?;

            for line in lines {
                stmt.execute(params![
                    &line.line_id,
                    &line.plan_id,
                    &line.line_name,
                    &line.budget,
                    &line.subdivision_id,
                    &line.moment_id,
                    &line.funnel_stage_id,
                    date_to_sql(line.start_date),
                    date_to_sql(line.end_date),
                    &line.utm_source,
                    &line.utm_medium,
                    &line.utm_campaign,
                    &line.utm_content,
                    &line.utm_term,
                    if line.utm_validated { 1 } else { 0 },
                ])?;
            }
        }

        tx.commit()?;
        Ok(lines.len())
    }

    /// 查询计划下全部投放行
    pub fn find_by_plan(&self, plan_id: &str) -> RepositoryResult<Vec<MediaLine>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM media_line WHERE plan_id = ? ORDER BY line_id",
            LINE_COLUMNS
        ))?;

        let lines = stmt
            .query_map(params![plan_id], |row| self.map_row(row))?
            .collect::<Result<Vec<MediaLine>, _>>()?;

        Ok(lines)
    }

    /// 删除计划下全部投放行
    ///
    /// # 返回
    /// - `Ok(rows)`: 删除的行数
    pub fn delete_by_plan(&self, plan_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM media_line WHERE plan_id = ?", params![plan_id])?;
        Ok(rows)
    }

    /// 映射数据库行到MediaLine对象
    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<MediaLine> {
        Ok(MediaLine {
            line_id: row.get(0)?,
            plan_id: row.get(1)?,
            line_name: row.get(2)?,
            budget: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            subdivision_id: row.get(4)?,
            moment_id: row.get(5)?,
            funnel_stage_id: row.get(6)?,
            start_date: get_opt_date(row, 7)?,
            end_date: get_opt_date(row, 8)?,
            utm_source: row.get(9)?,
            utm_medium: row.get(10)?,
            utm_campaign: row.get(11)?,
            utm_content: row.get(12)?,
            utm_term: row.get(13)?,
            utm_validated: row.get::<_, i32>(14)? != 0,
        })
    }
}
