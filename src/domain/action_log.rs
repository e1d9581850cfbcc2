// ==========================================
// 媒体计划预算核心 - 操作日志领域模型
// ==========================================
// 用途: 审计追踪 (层级变更 / 分配树重建 / 版本恢复)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,               // 日志ID
    pub plan_id: Option<String>,         // 关联计划
    pub action_type: String,             // 操作类型 (ActionType::as_str)
    pub action_ts: NaiveDateTime,        // 操作时间
    pub actor: String,                   // 操作人
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    UpdateHierarchy,      // 层级配置变更
    RebuildDistributions, // 分配树重建
    CaptureVersion,       // 记录版本
    RestoreVersion,       // 恢复版本
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::UpdateHierarchy => "UPDATE_HIERARCHY",
            ActionType::RebuildDistributions => "REBUILD_DISTRIBUTIONS",
            ActionType::CaptureVersion => "CAPTURE_VERSION",
            ActionType::RestoreVersion => "RESTORE_VERSION",
        }
    }
}

impl ActionLog {
    /// 构造一条操作日志 (action_id 自动生成)
    pub fn new(
        plan_id: &str,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            plan_id: Some(plan_id.to_string()),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}
