// ==========================================
// 媒体计划预算核心 - 配置层
// ==========================================
// 职责: 告警阈值与文案语言配置
// 存储: config_kv 表
// ==========================================

pub mod alert_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use alert_config_trait::AlertConfigReader;
pub use config_manager::{config_keys, ConfigManager, DEFAULT_LOCALE};
