use crate::domain::plan::PlanVersion;
use crate::repository::codec::{datetime_to_sql, get_datetime};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// PlanVersionRepository - 计划版本仓储
// ==========================================
pub struct PlanVersionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanVersionRepository {
    /// 创建新的PlanVersionRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建版本 (version_no 在事务内分配: 计划内最大值 + 1)
    ///
    /// 成功后回写 `version.version_no`
    pub fn create_with_next_version_no(&self, version: &mut PlanVersion) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let max_version_no: Option<i32> = tx.query_row(
            "SELECT MAX(version_no) FROM plan_version WHERE plan_id = ?",
            params![&version.plan_id],
            |row| row.get(0),
        )?;

        version.version_no = max_version_no.unwrap_or(0) + 1;

        tx.execute(
            r#"INSERT INTO plan_version (
                version_id, plan_id, version_no, snapshot_json,
                note, created_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &version.version_id,
                &version.plan_id,
                &version.version_no,
                &version.snapshot_json,
                &version.note,
                &version.created_by,
                datetime_to_sql(version.created_at),
            ],
        )?;

        tx.commit()?;
        Ok(version.version_id.clone())
    }

    /// 按version_id查询版本
    pub fn find_by_id(&self, version_id: &str) -> RepositoryResult<Option<PlanVersion>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT version_id, plan_id, version_no, snapshot_json,
                      note, created_by, created_at
               FROM plan_version
               WHERE version_id = ?"#,
            params![version_id],
            |row| self.map_row(row),
        ) {
            Ok(version) => Ok(Some(version)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询计划的所有版本 (版本号降序)
    pub fn find_by_plan_id(&self, plan_id: &str) -> RepositoryResult<Vec<PlanVersion>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT version_id, plan_id, version_no, snapshot_json,
                      note, created_by, created_at
               FROM plan_version
               WHERE plan_id = ?
               ORDER BY version_no DESC"#,
        )?;

        let versions = stmt
            .query_map(params![plan_id], |row| self.map_row(row))?
            .collect::<Result<Vec<PlanVersion>, _>>()?;

        Ok(versions)
    }

    /// 映射数据库行到PlanVersion对象
    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<PlanVersion> {
        Ok(PlanVersion {
            version_id: row.get(0)?,
            plan_id: row.get(1)?,
            version_no: row.get(2)?,
            snapshot_json: row.get(3)?,
            note: row.get(4)?,
            created_by: row.get(5)?,
            created_at: get_datetime(row, 6)?,
        })
    }
}
