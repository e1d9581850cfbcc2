// ==========================================
// 媒体计划预算核心 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键/ busy_timeout)
// - 提供幂等的建表入口, 供应用启动与测试复用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化 schema（幂等）
///
/// 说明：
/// - line_creative / line_monthly_budget 仅以 line_id 关联, 不设外键:
///   版本恢复会删除并按原ID重建投放行, 这些外部实体需保持有效
/// - budget_distribution 的 parent_distribution_id 自引用, 插入必须先父后子
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS media_plan (
            plan_id TEXT PRIMARY KEY,
            plan_name TEXT NOT NULL,
            total_budget REAL NOT NULL DEFAULT 0,
            start_date TEXT,
            end_date TEXT,
            hierarchy_order_json TEXT NOT NULL DEFAULT '[]',
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS media_line (
            line_id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES media_plan(plan_id) ON DELETE CASCADE,
            line_name TEXT NOT NULL DEFAULT '',
            budget REAL NOT NULL DEFAULT 0,
            subdivision_id TEXT,
            moment_id TEXT,
            funnel_stage_id TEXT,
            start_date TEXT,
            end_date TEXT,
            utm_source TEXT,
            utm_medium TEXT,
            utm_campaign TEXT,
            utm_content TEXT,
            utm_term TEXT,
            utm_validated INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_media_line_plan ON media_line(plan_id);

        CREATE TABLE IF NOT EXISTS line_creative (
            creative_id TEXT PRIMARY KEY,
            line_id TEXT NOT NULL,
            creative_name TEXT NOT NULL DEFAULT '',
            format_id TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_line_creative_line ON line_creative(line_id);

        CREATE TABLE IF NOT EXISTS line_monthly_budget (
            line_id TEXT NOT NULL,
            month TEXT NOT NULL,
            amount REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (line_id, month)
        );

        CREATE TABLE IF NOT EXISTS plan_moment (
            moment_id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES media_plan(plan_id) ON DELETE CASCADE,
            moment_name TEXT NOT NULL DEFAULT '',
            start_date TEXT,
            end_date TEXT
        );

        CREATE TABLE IF NOT EXISTS budget_distribution (
            distribution_id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES media_plan(plan_id) ON DELETE CASCADE,
            distribution_type TEXT NOT NULL,
            reference_id TEXT,
            parent_distribution_id TEXT
                REFERENCES budget_distribution(distribution_id) ON DELETE CASCADE,
            amount REAL NOT NULL DEFAULT 0,
            percentage REAL NOT NULL DEFAULT 0,
            start_date TEXT,
            end_date TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_budget_distribution_plan ON budget_distribution(plan_id);

        CREATE TABLE IF NOT EXISTS plan_version (
            version_id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES media_plan(plan_id) ON DELETE CASCADE,
            version_no INTEGER NOT NULL,
            snapshot_json TEXT NOT NULL,
            note TEXT,
            created_by TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (plan_id, version_no)
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            plan_id TEXT,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_action_log_plan ON action_log(plan_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
