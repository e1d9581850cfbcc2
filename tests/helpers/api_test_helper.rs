// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================
#![allow(dead_code)]

use std::sync::Arc;

use media_plan_budget::api::{ApiError, BudgetApi};
use media_plan_budget::config::ConfigManager;
use media_plan_budget::domain::hierarchy::HierarchyChange;
use media_plan_budget::domain::types::HierarchyLevel;
use media_plan_budget::engine::PlanRepositories;
use tempfile::NamedTempFile;

use crate::test_helpers;

// ==========================================
// ApiTestEnv - API测试环境
// ==========================================

pub struct ApiTestEnv {
    pub db_path: String,
    pub budget_api: BudgetApi,

    // Repository层（用于测试数据准备）
    pub repos: PlanRepositories,
    pub config_manager: Arc<ConfigManager>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境
    ///
    /// # 说明
    /// - 使用临时数据库文件
    /// - 仓储与配置共享同一连接
    pub fn new() -> Result<Self, String> {
        media_plan_budget::logging::init_test();

        let (temp_file, db_path) = test_helpers::create_test_db()
            .map_err(|e| format!("创建测试数据库失败: {}", e))?;
        let conn = test_helpers::open_shared_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        let repos = PlanRepositories::from_connection(conn.clone());
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let budget_api = BudgetApi::new(repos.clone(), config_manager.clone());

        Ok(Self {
            db_path,
            budget_api,
            repos,
            config_manager,
            _temp_file: temp_file,
        })
    }

    /// 创建计划 (总预算 + 无日期)
    pub fn create_plan(&self, total_budget: f64) -> String {
        self.budget_api
            .create_plan("测试计划", total_budget, None, None, "tester")
            .expect("创建计划失败")
    }

    /// 依次追加层级 (全部参与预算分配)
    pub async fn configure_levels(&self, plan_id: &str, levels: &[HierarchyLevel]) {
        for &level in levels {
            let result = self
                .budget_api
                .update_hierarchy(
                    plan_id,
                    HierarchyChange::Add {
                        level,
                        allocate_budget: true,
                    },
                    "tester",
                )
                .await
                .expect("层级变更失败");
            assert!(result.success, "分配树重建失败: {:?}", result.error);
        }
    }
}

// ==========================================
// 断言辅助函数
// ==========================================

pub fn assert_invalid_input(result: Result<impl std::fmt::Debug, ApiError>) {
    match result {
        Err(ApiError::InvalidInput(_)) => {}
        other => panic!("预期 InvalidInput，实际为 {:?}", other),
    }
}

pub fn assert_not_found(result: Result<impl std::fmt::Debug, ApiError>) {
    match result {
        Err(ApiError::NotFound(_)) => {}
        other => panic!("预期 NotFound，实际为 {:?}", other),
    }
}

/// 验证计划下某类操作日志的条数
pub fn assert_action_logged(
    env: &ApiTestEnv,
    plan_id: &str,
    action_type: &str,
    expected_count: i64,
) -> Result<(), String> {
    let count = env
        .repos
        .action_log_repo
        .count_by_plan_and_type(plan_id, action_type)
        .map_err(|e| format!("查询ActionLog失败: {}", e))?;

    if count != expected_count {
        return Err(format!(
            "预期{}条{}类型的ActionLog，实际找到{}条",
            expected_count, action_type, count
        ));
    }

    Ok(())
}

/// 验证计划最近一条操作日志的操作人
pub fn assert_action_has_operator(
    env: &ApiTestEnv,
    plan_id: &str,
    operator: &str,
) -> Result<(), String> {
    let logs = env
        .repos
        .action_log_repo
        .find_by_plan(plan_id, 1)
        .map_err(|e| format!("查询ActionLog失败: {}", e))?;

    let latest_log = logs.first().ok_or("未找到任何ActionLog")?;
    if latest_log.actor != operator {
        return Err(format!(
            "预期operator为{}，实际为{}",
            operator, latest_log.actor
        ));
    }

    Ok(())
}
