// ==========================================
// 媒体计划预算核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::alert_config_trait::AlertConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::alert::AlertThresholds;
use crate::i18n::is_supported_locale;
pub use crate::i18n::DEFAULT_LOCALE;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取 global scope 的配置值（不存在返回 None）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    /// 获取所有配置的快照（JSON格式, 按键排序）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取比例型配置: 需为 (0, 1] 内的有限值, 否则使用默认值
    fn get_ratio_or_default(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 && v <= 1.0 => Ok(v),
            _ => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置值无效，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// AlertConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AlertConfigReader for ConfigManager {
    async fn get_concentration_ratio(&self) -> Result<f64, Box<dyn Error>> {
        let default = AlertThresholds::default().concentration_ratio;
        self.get_ratio_or_default(config_keys::CONCENTRATION_RATIO, default)
    }

    async fn get_underutilization_ratio(&self) -> Result<f64, Box<dyn Error>> {
        let default = AlertThresholds::default().underutilization_ratio;
        self.get_ratio_or_default(config_keys::UNDERUTILIZATION_RATIO, default)
    }

    async fn get_money_epsilon(&self) -> Result<f64, Box<dyn Error>> {
        let default = AlertThresholds::default().money_epsilon;
        let Some(raw) = self.get_global_config_value(config_keys::MONEY_EPSILON)? else {
            return Ok(default);
        };
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = config_keys::MONEY_EPSILON,
                    raw_value = %raw,
                    "金额容差配置无效，使用默认值"
                );
                Ok(default)
            }
        }
    }

    async fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self
            .get_global_config_value(config_keys::LOCALE)?
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        if is_supported_locale(&value) {
            Ok(value)
        } else {
            Ok(DEFAULT_LOCALE.to_string())
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 告警阈值
    pub const CONCENTRATION_RATIO: &str = "alert.concentration_ratio";
    pub const UNDERUTILIZATION_RATIO: &str = "alert.underutilization_ratio";
    pub const MONEY_EPSILON: &str = "alert.money_epsilon";

    // 告警文案语言
    pub const LOCALE: &str = "app.locale";
}
