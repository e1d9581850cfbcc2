// ==========================================
// 媒体计划预算核心 - 领域类型定义
// ==========================================
// 层级维度 / 告警级别 / 告警类别
// 序列化格式: snake_case (与数据库存储一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 层级维度 (Hierarchy Level)
// ==========================================
// 固定封闭集合: 细分 / 时段 / 漏斗阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    Subdivision, // 细分
    Moment,      // 时段
    FunnelStage, // 漏斗阶段
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl HierarchyLevel {
    /// 全部层级 (固定顺序)
    pub const ALL: [HierarchyLevel; 3] = [
        HierarchyLevel::Subdivision,
        HierarchyLevel::Moment,
        HierarchyLevel::FunnelStage,
    ];

    /// 从字符串解析层级
    ///
    /// 未知字符串返回 None (不做默认值兜底，避免静默写错维度)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "subdivision" => Some(HierarchyLevel::Subdivision),
            "moment" => Some(HierarchyLevel::Moment),
            "funnel_stage" => Some(HierarchyLevel::FunnelStage),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            HierarchyLevel::Subdivision => "subdivision",
            HierarchyLevel::Moment => "moment",
            HierarchyLevel::FunnelStage => "funnel_stage",
        }
    }
}

// ==========================================
// 告警级别 (Alert Level)
// ==========================================
// 顺序: Error < Warning < Info (按严重程度排序时 Error 在前)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Error,   // 错误
    Warning, // 警告
    Info,    // 提示
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Error => write!(f, "error"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Info => write!(f, "info"),
        }
    }
}

// ==========================================
// 告警类别 (Alert Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Budget,   // 预算
    Creative, // 素材
    Config,   // 配置
    Timing,   // 排期
    Utm,      // UTM 追踪
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertCategory::Budget => write!(f, "budget"),
            AlertCategory::Creative => write!(f, "creative"),
            AlertCategory::Config => write!(f, "config"),
            AlertCategory::Timing => write!(f, "timing"),
            AlertCategory::Utm => write!(f, "utm"),
        }
    }
}
