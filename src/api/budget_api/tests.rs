use super::*;
use crate::config::config_keys;
use crate::domain::hierarchy::HierarchyConfigError;
use crate::domain::line::Creative;
use crate::domain::types::HierarchyLevel;
use rusqlite::Connection;
use std::sync::Mutex;

// ==========================================
// 测试辅助
// ==========================================

fn setup() -> (BudgetApi, PlanRepositories) {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    let conn = Arc::new(Mutex::new(conn));

    let repos = PlanRepositories::from_connection(conn.clone());
    let config = Arc::new(ConfigManager::from_connection(conn).unwrap());
    (BudgetApi::new(repos.clone(), config), repos)
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn line(plan_id: &str, id: &str, budget: f64, subdivision: &str, moment: &str) -> MediaLine {
    let mut line = MediaLine::new(id, plan_id, budget);
    line.subdivision_id = Some(subdivision.to_string());
    line.moment_id = Some(moment.to_string());
    line
}

fn add(level: HierarchyLevel) -> HierarchyChange {
    HierarchyChange::Add {
        level,
        allocate_budget: true,
    }
}

// ==========================================
// 计划管理
// ==========================================

#[test]
fn test_create_plan_validation() {
    let (api, _) = setup();

    assert!(matches!(
        api.create_plan("  ", 1000.0, None, None, "tester"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.create_plan("Plan", -1.0, None, None, "tester"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.create_plan("Plan", 1000.0, Some(ymd(2026, 3, 1)), Some(ymd(2026, 2, 1)), "tester"),
        Err(ApiError::InvalidInput(_))
    ));

    let plan_id = api
        .create_plan("Plan", 1000.0, Some(ymd(2026, 1, 1)), Some(ymd(2026, 12, 31)), "tester")
        .unwrap();
    let plan = api.get_plan(&plan_id).unwrap();
    assert_eq!(plan.total_budget, 1000.0);
    assert!(plan.hierarchy_order.is_empty());
}

#[test]
fn test_get_missing_plan_is_not_found() {
    let (api, _) = setup();
    assert!(matches!(api.get_plan("nope"), Err(ApiError::NotFound(_))));
}

#[test]
fn test_add_lines_rejects_foreign_plan() {
    let (api, _) = setup();
    let plan_id = api.create_plan("Plan", 1000.0, None, None, "tester").unwrap();

    let foreign = MediaLine::new("L1", "other-plan", 100.0);
    assert!(matches!(
        api.add_lines(&plan_id, &[foreign]),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(api.list_lines(&plan_id).unwrap().is_empty());
}

// ==========================================
// 层级配置 + 分配树
// ==========================================

#[tokio::test]
async fn test_update_hierarchy_rebuilds_tree() {
    let (api, _) = setup();
    let plan_id = api.create_plan("Plan", 100000.0, None, None, "tester").unwrap();
    api.add_lines(
        &plan_id,
        &[
            line(&plan_id, "L1", 50000.0, "S1", "M1"),
            line(&plan_id, "L2", 50000.0, "S2", "M1"),
        ],
    )
    .unwrap();

    let result = api
        .update_hierarchy(&plan_id, add(HierarchyLevel::Subdivision), "tester")
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.count, 2);

    let result = api
        .update_hierarchy(&plan_id, add(HierarchyLevel::Moment), "tester")
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.count, 4);

    let distributions = api.list_distributions(&plan_id).unwrap();
    let roots: Vec<_> = distributions.iter().filter(|d| d.is_root()).collect();
    assert_eq!(roots.len(), 2);
    for root in &roots {
        assert_eq!(root.distribution_type, HierarchyLevel::Subdivision);
        assert!((root.percentage - 50.0).abs() < 1e-9);

        let children: Vec<_> = distributions
            .iter()
            .filter(|d| d.parent_distribution_id.as_deref() == Some(root.distribution_id.as_str()))
            .collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].distribution_type, HierarchyLevel::Moment);
        assert!((children[0].percentage - 100.0).abs() < 1e-9);
    }
    assert!(!api.is_distribution_stale(&plan_id).unwrap());

    // 移除层级后不再有该层级节点
    api.update_hierarchy(
        &plan_id,
        HierarchyChange::Remove {
            level: HierarchyLevel::Moment,
        },
        "tester",
    )
    .await
    .unwrap();
    let distributions = api.list_distributions(&plan_id).unwrap();
    assert_eq!(distributions.len(), 2);
    assert!(distributions
        .iter()
        .all(|d| d.distribution_type == HierarchyLevel::Subdivision));
}

#[tokio::test]
async fn test_invalid_hierarchy_change_is_rejected_before_store() {
    let (api, repos) = setup();
    let plan_id = api.create_plan("Plan", 1000.0, None, None, "tester").unwrap();
    api.update_hierarchy(&plan_id, add(HierarchyLevel::Subdivision), "tester")
        .await
        .unwrap();
    let logs_before = api.list_action_logs(&plan_id, 100).unwrap().len();

    let err = api
        .update_hierarchy(&plan_id, add(HierarchyLevel::Subdivision), "tester")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::HierarchyConfig(HierarchyConfigError::DuplicateLevel(HierarchyLevel::Subdivision))
    ));

    // 顺序与日志均未变化
    let plan = repos.plan_repo.find_by_id(&plan_id).unwrap().unwrap();
    assert_eq!(plan.hierarchy_order.levels(), vec![HierarchyLevel::Subdivision]);
    assert_eq!(api.list_action_logs(&plan_id, 100).unwrap().len(), logs_before);
}

#[tokio::test]
async fn test_rebuild_logs_action_and_is_idempotent() {
    let (api, repos) = setup();
    let plan_id = api.create_plan("Plan", 1000.0, None, None, "tester").unwrap();
    api.add_lines(&plan_id, &[line(&plan_id, "L1", 600.0, "S1", "M1")])
        .unwrap();
    api.update_hierarchy(&plan_id, add(HierarchyLevel::Subdivision), "tester")
        .await
        .unwrap();

    let first = api.list_distributions(&plan_id).unwrap();
    let result = api.rebuild_distributions(&plan_id, "tester").await.unwrap();
    assert!(result.success);
    let second = api.list_distributions(&plan_id).unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].amount, second[0].amount);
    assert_eq!(first[0].percentage, second[0].percentage);

    let rebuilds = repos
        .action_log_repo
        .count_by_plan_and_type(&plan_id, ActionType::RebuildDistributions.as_str())
        .unwrap();
    assert_eq!(rebuilds, 2);
}

#[tokio::test]
async fn test_preview_does_not_write() {
    let (api, repos) = setup();
    let plan_id = api.create_plan("Plan", 1000.0, None, None, "tester").unwrap();
    api.add_lines(&plan_id, &[line(&plan_id, "L1", 400.0, "S1", "M1")])
        .unwrap();
    repos
        .plan_repo
        .update_hierarchy_order(
            &plan_id,
            &HierarchyOrder::from_levels(&[HierarchyLevel::Subdivision]).unwrap(),
        )
        .unwrap();

    let preview = api.preview_distributions(&plan_id).unwrap();
    assert_eq!(preview.len(), 1);
    assert_eq!(preview.root_amount(), 400.0);
    assert!(api.list_distributions(&plan_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_stale_tree_after_direct_order_change() {
    let (api, repos) = setup();
    let plan_id = api.create_plan("Plan", 1000.0, None, None, "tester").unwrap();
    api.add_lines(&plan_id, &[line(&plan_id, "L1", 400.0, "S1", "M1")])
        .unwrap();
    api.update_hierarchy(&plan_id, add(HierarchyLevel::Subdivision), "tester")
        .await
        .unwrap();
    api.update_hierarchy(&plan_id, add(HierarchyLevel::Moment), "tester")
        .await
        .unwrap();

    let plan = api.get_plan(&plan_id).unwrap();
    let swapped = plan.hierarchy_order.swap_levels(0, 1).unwrap();
    repos
        .plan_repo
        .update_hierarchy_order(&plan_id, &swapped)
        .unwrap();

    assert!(api.is_distribution_stale(&plan_id).unwrap());
    api.rebuild_distributions(&plan_id, "tester").await.unwrap();
    assert!(!api.is_distribution_stale(&plan_id).unwrap());
}

#[tokio::test]
async fn test_stale_tree_after_level_added_or_never_built() {
    let (api, repos) = setup();
    let plan_id = api.create_plan("Plan", 1000.0, None, None, "tester").unwrap();
    api.add_lines(&plan_id, &[line(&plan_id, "L1", 400.0, "S1", "M1")])
        .unwrap();

    // 已配置层级但从未构建
    let order = HierarchyOrder::from_levels(&[HierarchyLevel::Subdivision]).unwrap();
    repos
        .plan_repo
        .update_hierarchy_order(&plan_id, &order)
        .unwrap();
    assert!(api.list_distributions(&plan_id).unwrap().is_empty());
    assert!(api.is_distribution_stale(&plan_id).unwrap());

    api.rebuild_distributions(&plan_id, "tester").await.unwrap();
    assert!(!api.is_distribution_stale(&plan_id).unwrap());

    // 新增层级后旧树缺少该层
    let added = order.add_level(HierarchyLevel::Moment, true).unwrap();
    repos
        .plan_repo
        .update_hierarchy_order(&plan_id, &added)
        .unwrap();
    assert!(api.is_distribution_stale(&plan_id).unwrap());

    api.rebuild_distributions(&plan_id, "tester").await.unwrap();
    assert!(!api.is_distribution_stale(&plan_id).unwrap());
}

// ==========================================
// 一致性告警
// ==========================================

#[tokio::test]
async fn test_evaluate_alerts_reads_config() {
    let (api, _) = setup();
    let plan_id = api.create_plan("Plan", 100000.0, None, None, "tester").unwrap();
    api.add_lines(
        &plan_id,
        &[
            line(&plan_id, "L1", 40000.0, "S1", "M1"),
            line(&plan_id, "L2", 40000.0, "S1", "M1"),
            line(&plan_id, "L3", 30000.0, "S2", "M1"),
        ],
    )
    .unwrap();

    let report = api.evaluate_alerts(&plan_id, ymd(2026, 6, 1)).await.unwrap();
    let overage = report
        .get(&format!("budget-overage-{}", plan_id))
        .expect("plan overage alert");
    assert_eq!(overage.amount, Some(10000.0));
    assert!(report.has_errors());

    // 默认集中阈值 0.5 下无集中告警; 调低后出现
    assert!(report.get("concentration-L1").is_none());
    api.config_manager
        .set_global_config_value(config_keys::CONCENTRATION_RATIO, "0.3")
        .unwrap();
    let report = api.evaluate_alerts(&plan_id, ymd(2026, 6, 1)).await.unwrap();
    assert!(report.get("concentration-L1").is_some());
    assert!(report.get("concentration-L3").is_none());
}

#[tokio::test]
async fn test_evaluate_alerts_uses_configured_locale() {
    let _guard = crate::i18n::LOCALE_TEST_LOCK
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let (api, repos) = setup();
    let plan_id = api.create_plan("Plan", 1000.0, None, None, "tester").unwrap();
    api.add_lines(&plan_id, &[line(&plan_id, "L1", 500.0, "S1", "M1")])
        .unwrap();
    repos
        .asset_repo
        .insert_creative(&Creative {
            creative_id: "C1".to_string(),
            line_id: "L1".to_string(),
            creative_name: "Banner".to_string(),
            format_id: None,
        })
        .unwrap();

    let before = crate::i18n::current_locale();
    api.config_manager
        .set_global_config_value(config_keys::LOCALE, "en")
        .unwrap();
    let report = api.evaluate_alerts(&plan_id, ymd(2026, 6, 1)).await.unwrap();
    assert!(report.get("no-creatives-L1").is_none());
    let alert = report.get("creative-no-format-C1").expect("format alert");
    assert!(alert.title.is_ascii());

    // 文案语言来自配置, 全局语言不变
    assert_eq!(crate::i18n::current_locale(), before);

    api.config_manager
        .set_global_config_value(config_keys::LOCALE, "zh-CN")
        .unwrap();
    let report = api.evaluate_alerts(&plan_id, ymd(2026, 6, 1)).await.unwrap();
    let alert = report.get("creative-no-format-C1").expect("format alert");
    assert!(!alert.title.is_ascii());
}

#[tokio::test]
async fn test_evaluate_alerts_missing_plan() {
    let (api, _) = setup();
    let err = api.evaluate_alerts("nope", ymd(2026, 6, 1)).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// ==========================================
// 版本管理
// ==========================================

#[tokio::test]
async fn test_capture_and_restore_through_api() {
    let (api, _) = setup();
    let plan_id = api.create_plan("Plan", 1000.0, None, None, "tester").unwrap();
    api.add_lines(&plan_id, &[line(&plan_id, "L1", 400.0, "S1", "M1")])
        .unwrap();
    api.update_hierarchy(&plan_id, add(HierarchyLevel::Subdivision), "tester")
        .await
        .unwrap();

    let v1 = api
        .capture_version(&plan_id, Some("baseline".to_string()), "tester")
        .unwrap();
    let baseline_ids: Vec<String> = api
        .list_distributions(&plan_id)
        .unwrap()
        .into_iter()
        .map(|d| d.distribution_id)
        .collect();

    api.update_hierarchy(&plan_id, add(HierarchyLevel::Moment), "tester")
        .await
        .unwrap();
    assert_eq!(api.list_distributions(&plan_id).unwrap().len(), 2);

    let result = api.restore_version(&plan_id, &v1.version_id, "tester").unwrap();
    assert_eq!(result.restored_version_id, v1.version_id);
    assert_eq!(result.distributions_restored, 1);

    let restored_ids: Vec<String> = api
        .list_distributions(&plan_id)
        .unwrap()
        .into_iter()
        .map(|d| d.distribution_id)
        .collect();
    assert_eq!(restored_ids, baseline_ids);
    assert_eq!(
        api.get_plan(&plan_id).unwrap().hierarchy_order.levels(),
        vec![HierarchyLevel::Subdivision]
    );

    // baseline + 恢复前 + 恢复后
    assert_eq!(api.list_versions(&plan_id).unwrap().len(), 3);
}

#[test]
fn test_restore_unknown_version() {
    let (api, _) = setup();
    let plan_id = api.create_plan("Plan", 1000.0, None, None, "tester").unwrap();
    let err = api.restore_version(&plan_id, "missing", "tester").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
