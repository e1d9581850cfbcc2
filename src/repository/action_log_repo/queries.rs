use super::core::ActionLogRepository;
use crate::domain::action_log::ActionLog;
use crate::repository::codec::get_datetime;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, plan_id, action_type, action_ts, actor, payload_json, detail
    FROM action_log
"#;

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!("{} WHERE action_id = ?", SELECT_COLUMNS))?;

        match stmt.query_row(params![action_id], |row| self.map_row(row)) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询计划的操作日志 (最新在前)
    pub fn find_by_plan(&self, plan_id: &str, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE plan_id = ? ORDER BY action_ts DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        ))?;

        let logs = stmt
            .query_map(params![plan_id, limit as i64], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 统计计划某类操作次数
    pub fn count_by_plan_and_type(&self, plan_id: &str, action_type: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE plan_id = ? AND action_type = ?",
            params![plan_id, action_type],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 映射数据库行到ActionLog对象
    fn map_row(&self, row: &Row) -> SqliteResult<ActionLog> {
        let payload_json: Option<String> = row.get(5)?;

        Ok(ActionLog {
            action_id: row.get(0)?,
            plan_id: row.get(1)?,
            action_type: row.get(2)?,
            action_ts: get_datetime(row, 3)?,
            actor: row.get(4)?,
            // 历史数据中无法解析的 payload 视为空
            payload_json: payload_json.and_then(|s| serde_json::from_str(&s).ok()),
            detail: row.get(6)?,
        })
    }
}
