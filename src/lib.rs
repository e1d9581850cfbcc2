// ==========================================
// 媒体计划预算核心 - 核心库
// ==========================================
// 职责: 层级预算分配 + 一致性告警 + 版本快照回放
// 技术栈: Rust + SQLite
// 系统定位: 计划编辑器进程内调用的库, 不含界面与导出
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 告警阈值与语言
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AlertCategory, AlertLevel, HierarchyLevel};

// 领域实体
pub use domain::{
    ActionLog, ActionType, BudgetDistribution, Creative, HierarchyChange, HierarchyOrder,
    MediaLine, MediaPlan, Moment, MonthlyBudget, PlanAlert, PlanVersion,
};

// 引擎
pub use engine::{
    DistributionBuildResult, DistributionTreeBuilder, PlanAlertEngine, PlanAlertInput,
    PlanAlertReport, SnapshotReplayEngine,
};

// API
pub use api::{ApiError, ApiResult, BudgetApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "媒体计划预算核心";
