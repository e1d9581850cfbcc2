// ==========================================
// 媒体计划预算核心 - 告警配置读取 Trait
// ==========================================
// 职责: 定义告警引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::alert::AlertThresholds;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// AlertConfigReader Trait
// ==========================================
// 用途: 告警阈值与文案语言的读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AlertConfigReader: Send + Sync {
    /// 获取预算集中阈值（单行/总预算）
    ///
    /// # 默认值
    /// - 0.5
    async fn get_concentration_ratio(&self) -> Result<f64, Box<dyn Error>>;

    /// 获取未充分使用阈值（已分配/总预算）
    ///
    /// # 默认值
    /// - 0.8
    async fn get_underutilization_ratio(&self) -> Result<f64, Box<dyn Error>>;

    /// 获取金额比较容差
    ///
    /// # 默认值
    /// - 0.01
    async fn get_money_epsilon(&self) -> Result<f64, Box<dyn Error>>;

    /// 获取告警文案语言
    ///
    /// # 默认值
    /// - zh-CN
    async fn get_locale(&self) -> Result<String, Box<dyn Error>>;

    /// 获取完整告警阈值
    async fn get_alert_thresholds(&self) -> Result<AlertThresholds, Box<dyn Error>> {
        let concentration_ratio = self.get_concentration_ratio().await?;
        let underutilization_ratio = self.get_underutilization_ratio().await?;
        let money_epsilon = self.get_money_epsilon().await?;

        Ok(AlertThresholds {
            concentration_ratio,
            underutilization_ratio,
            money_epsilon,
        })
    }
}
