use super::*;
use crate::domain::distribution::NewBudgetDistribution;
use crate::domain::hierarchy::HierarchyOrder;
use crate::domain::line::MediaLine;
use crate::domain::types::HierarchyLevel;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

// ==========================================
// 测试辅助
// ==========================================

/// 内存存储: 记录插入行, 可指定第 N 次批量插入失败
#[derive(Default)]
struct MemoryStore {
    rows: Mutex<Vec<(String, NewBudgetDistribution)>>,
    insert_calls: Mutex<usize>,
    fail_on_insert_call: Option<usize>,
    fail_on_delete: bool,
}

impl MemoryStore {
    fn failing_at(call: usize) -> Self {
        Self {
            fail_on_insert_call: Some(call),
            ..Default::default()
        }
    }

    fn rows(&self) -> Vec<(String, NewBudgetDistribution)> {
        self.rows.lock().unwrap().clone()
    }

    fn rows_at_level(&self, level: HierarchyLevel) -> Vec<NewBudgetDistribution> {
        self.rows()
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| r.distribution_type == level)
            .collect()
    }
}

#[async_trait]
impl DistributionStore for MemoryStore {
    async fn delete_by_plan(&self, plan_id: &str) -> RepositoryResult<usize> {
        if self.fail_on_delete {
            return Err(RepositoryError::DatabaseQueryError("delete failed".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|(_, r)| r.plan_id != plan_id);
        Ok(before - rows.len())
    }

    async fn insert_batch(&self, batch: &[NewBudgetDistribution]) -> RepositoryResult<Vec<String>> {
        let call = {
            let mut calls = self.insert_calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if self.fail_on_insert_call == Some(call) {
            return Err(RepositoryError::DatabaseQueryError(format!("insert #{} failed", call)));
        }

        let mut rows = self.rows.lock().unwrap();
        let mut ids = Vec::with_capacity(batch.len());
        for row in batch {
            let id = format!("d{}", rows.len() + 1);
            rows.push((id.clone(), row.clone()));
            ids.push(id);
        }
        Ok(ids)
    }
}

fn line(id: &str, budget: f64, subdivision: Option<&str>, moment: Option<&str>) -> MediaLine {
    let mut line = MediaLine::new(id, "P1", budget);
    line.subdivision_id = subdivision.map(|s| s.to_string());
    line.moment_id = moment.map(|m| m.to_string());
    line
}

fn order(levels: &[HierarchyLevel]) -> HierarchyOrder {
    HierarchyOrder::from_levels(levels).unwrap()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==========================================
// 规划 (纯函数)
// ==========================================

#[test]
fn test_empty_order_plans_no_nodes() {
    let lines = vec![line("L1", 100.0, Some("S1"), None)];
    let plan = plan_distribution_tree(&HierarchyOrder::empty(), &lines, 1000.0);
    assert!(plan.is_empty());
    assert_eq!(plan.depth_count(), 0);
}

#[test]
fn test_depth_zero_partition_is_total() {
    let lines = vec![
        line("L1", 100.0, Some("S1"), None),
        line("L2", 250.5, Some("S2"), None),
        line("L3", 49.5, None, None),
        line("L4", 600.0, Some("S1"), None),
        line("L5", 0.0, Some("  "), None),
    ];
    let plan = plan_distribution_tree(&order(&[HierarchyLevel::Subdivision]), &lines, 2000.0);

    let line_sum: f64 = lines.iter().map(|l| l.budget).sum();
    assert!((plan.root_amount() - line_sum).abs() < 1e-9);

    let refs: Vec<Option<&str>> = plan.nodes.iter().map(|n| n.reference_id.as_deref()).collect();
    assert_eq!(refs, vec![None, Some("S1"), Some("S2")]);

    let unassigned = &plan.nodes[0];
    assert_eq!(unassigned.line_count, 2);
    assert!((unassigned.amount - 49.5).abs() < 1e-9);
}

#[test]
fn test_percentage_zero_when_denominator_zero() {
    let lines = vec![line("L1", 100.0, Some("S1"), Some("M1"))];
    let plan = plan_distribution_tree(
        &order(&[HierarchyLevel::Subdivision, HierarchyLevel::Moment]),
        &lines,
        0.0,
    );
    assert_eq!(plan.nodes[0].percentage, 0.0);
    assert!((plan.nodes[1].percentage - 100.0).abs() < 1e-9);

    let zero_lines = vec![line("L1", 0.0, Some("S1"), Some("M1"))];
    let plan = plan_distribution_tree(
        &order(&[HierarchyLevel::Subdivision, HierarchyLevel::Moment]),
        &zero_lines,
        1000.0,
    );
    assert_eq!(plan.nodes[0].percentage, 0.0);
    assert_eq!(plan.nodes[1].percentage, 0.0);
}

#[test]
fn test_children_percentage_relative_to_parent() {
    let lines = vec![
        line("L1", 300.0, Some("S1"), Some("M1")),
        line("L2", 100.0, Some("S1"), Some("M2")),
        line("L3", 600.0, Some("S2"), Some("M1")),
    ];
    let plan = plan_distribution_tree(
        &order(&[HierarchyLevel::Subdivision, HierarchyLevel::Moment]),
        &lines,
        2000.0,
    );

    assert_eq!(plan.len(), 5);
    let s1 = plan
        .nodes_at_depth(0)
        .find(|(_, n)| n.reference_id.as_deref() == Some("S1"))
        .map(|(i, _)| i)
        .unwrap();
    assert!((plan.nodes[s1].percentage - 20.0).abs() < 1e-9);

    let children: Vec<_> = plan.children_of(s1).map(|(_, n)| n).collect();
    assert_eq!(children.len(), 2);
    assert!((children[0].percentage - 75.0).abs() < 1e-9);
    assert!((children[1].percentage - 25.0).abs() < 1e-9);
}

#[test]
fn test_moment_level_carries_date_span() {
    let mut l1 = line("L1", 100.0, Some("S1"), Some("M1"));
    l1.start_date = Some(ymd(2025, 3, 10));
    l1.end_date = Some(ymd(2025, 4, 1));
    let mut l2 = line("L2", 100.0, Some("S1"), Some("M1"));
    l2.start_date = Some(ymd(2025, 3, 1));
    l2.end_date = Some(ymd(2025, 3, 20));

    let plan = plan_distribution_tree(
        &order(&[HierarchyLevel::Subdivision, HierarchyLevel::Moment]),
        &[l1, l2],
        200.0,
    );

    assert_eq!(plan.nodes[0].start_date, None);
    assert_eq!(plan.nodes[1].level, HierarchyLevel::Moment);
    assert_eq!(plan.nodes[1].start_date, Some(ymd(2025, 3, 1)));
    assert_eq!(plan.nodes[1].end_date, Some(ymd(2025, 4, 1)));
}

#[test]
fn test_three_levels_nodes_ordered_by_depth() {
    let mut l1 = line("L1", 100.0, Some("S1"), Some("M1"));
    l1.funnel_stage_id = Some("F1".to_string());
    let l2 = line("L2", 50.0, Some("S2"), None);

    let plan = plan_distribution_tree(
        &order(&[
            HierarchyLevel::Subdivision,
            HierarchyLevel::Moment,
            HierarchyLevel::FunnelStage,
        ]),
        &[l1, l2],
        150.0,
    );

    assert_eq!(plan.depth_count(), 3);
    let depths: Vec<usize> = plan.nodes.iter().map(|n| n.depth).collect();
    assert!(depths.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(plan.nodes_at_depth(2).count(), 2);
}

// ==========================================
// 构建 (两阶段插入)
// ==========================================

#[tokio::test]
async fn test_two_subdivisions_with_moment_children() {
    let store = Arc::new(MemoryStore::default());
    let builder = DistributionTreeBuilder::new(store.clone());

    let lines = vec![
        line("L1", 50000.0, Some("S1"), Some("M1")),
        line("L2", 50000.0, Some("S2"), Some("M1")),
    ];
    let result = builder
        .build(
            "P1",
            &order(&[HierarchyLevel::Subdivision, HierarchyLevel::Moment]),
            &lines,
            100000.0,
        )
        .await;

    assert!(result.success);
    assert_eq!(result.count, 4);
    assert!(result.error.is_none());

    let rows = store.rows();
    let roots: Vec<_> = rows.iter().filter(|(_, r)| r.parent_distribution_id.is_none()).collect();
    assert_eq!(roots.len(), 2);
    for (root_id, root) in roots {
        assert_eq!(root.distribution_type, HierarchyLevel::Subdivision);
        assert!((root.percentage - 50.0).abs() < 1e-9);

        let children: Vec<_> = rows
            .iter()
            .filter(|(_, r)| r.parent_distribution_id.as_deref() == Some(root_id.as_str()))
            .collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].1.distribution_type, HierarchyLevel::Moment);
        assert!((children[0].1.percentage - 100.0).abs() < 1e-9);
        assert!((children[0].1.amount - 50000.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let store = Arc::new(MemoryStore::default());
    let builder = DistributionTreeBuilder::new(store.clone());
    let hierarchy = order(&[HierarchyLevel::Moment, HierarchyLevel::Subdivision]);
    let lines = vec![
        line("L1", 120.0, Some("S1"), Some("M1")),
        line("L2", 80.0, None, Some("M1")),
        line("L3", 300.0, Some("S2"), None),
    ];

    let first = builder.build("P1", &hierarchy, &lines, 1000.0).await;
    let snapshot_1: Vec<_> = store
        .rows()
        .into_iter()
        .map(|(_, r)| (r.distribution_type, r.reference_id, r.amount, r.percentage))
        .collect();

    let second = builder.build("P1", &hierarchy, &lines, 1000.0).await;
    let snapshot_2: Vec<_> = store
        .rows()
        .into_iter()
        .map(|(_, r)| (r.distribution_type, r.reference_id, r.amount, r.percentage))
        .collect();

    assert!(first.success && second.success);
    assert_eq!(first.count, second.count);
    assert_eq!(snapshot_1, snapshot_2);
}

#[tokio::test]
async fn test_removed_level_leaves_no_residual_nodes() {
    let store = Arc::new(MemoryStore::default());
    let builder = DistributionTreeBuilder::new(store.clone());
    let lines = vec![
        line("L1", 100.0, Some("S1"), Some("M1")),
        line("L2", 100.0, Some("S2"), Some("M2")),
    ];

    let full = order(&[HierarchyLevel::Subdivision, HierarchyLevel::Moment]);
    builder.build("P1", &full, &lines, 200.0).await;
    assert_eq!(store.rows_at_level(HierarchyLevel::Moment).len(), 2);

    let reduced = full.remove_level(HierarchyLevel::Moment).unwrap();
    let result = builder.build("P1", &reduced, &lines, 200.0).await;

    assert!(result.success);
    assert!(store.rows_at_level(HierarchyLevel::Moment).is_empty());
    assert_eq!(store.rows_at_level(HierarchyLevel::Subdivision).len(), 2);
}

#[tokio::test]
async fn test_empty_order_clears_existing_tree() {
    let store = Arc::new(MemoryStore::default());
    let builder = DistributionTreeBuilder::new(store.clone());
    let lines = vec![line("L1", 100.0, Some("S1"), None)];

    builder
        .build("P1", &order(&[HierarchyLevel::Subdivision]), &lines, 100.0)
        .await;
    assert_eq!(store.rows().len(), 1);

    let result = builder.build("P1", &HierarchyOrder::empty(), &lines, 100.0).await;
    assert!(result.success);
    assert_eq!(result.count, 0);
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn test_orphaned_reference_is_still_built() {
    let store = Arc::new(MemoryStore::default());
    let builder = DistributionTreeBuilder::new(store.clone());
    let lines = vec![line("L1", 100.0, Some("deleted-subdivision"), None)];

    let result = builder
        .build("P1", &order(&[HierarchyLevel::Subdivision]), &lines, 100.0)
        .await;

    assert!(result.success);
    assert_eq!(
        store.rows()[0].1.reference_id.as_deref(),
        Some("deleted-subdivision")
    );
}

#[tokio::test]
async fn test_failure_at_depth_one_keeps_depth_zero() {
    let store = Arc::new(MemoryStore::failing_at(2));
    let builder = DistributionTreeBuilder::new(store.clone());
    let lines = vec![
        line("L1", 100.0, Some("S1"), Some("M1")),
        line("L2", 100.0, Some("S2"), Some("M1")),
    ];

    let result = builder
        .build(
            "P1",
            &order(&[HierarchyLevel::Subdivision, HierarchyLevel::Moment]),
            &lines,
            200.0,
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.failed_depth, Some(1));
    assert_eq!(result.count, 2);
    assert!(result.error.unwrap().contains("insert #2 failed"));
    // 已插入的深度不回滚
    assert_eq!(store.rows().len(), 2);
}

#[tokio::test]
async fn test_delete_failure_reports_without_inserting() {
    let store = Arc::new(MemoryStore {
        fail_on_delete: true,
        ..Default::default()
    });
    let builder = DistributionTreeBuilder::new(store.clone());

    let result = builder
        .build(
            "P1",
            &order(&[HierarchyLevel::Subdivision]),
            &[line("L1", 1.0, None, None)],
            1.0,
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.failed_depth, None);
    assert_eq!(result.count, 0);
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn test_keep_existing_option_appends() {
    let store = Arc::new(MemoryStore::default());
    let builder = DistributionTreeBuilder::new(store.clone());
    let hierarchy = order(&[HierarchyLevel::Subdivision]);
    let lines = vec![line("L1", 1.0, Some("S1"), None)];

    builder.build("P1", &hierarchy, &lines, 1.0).await;
    let result = builder
        .build_with_options(
            "P1",
            &hierarchy,
            &lines,
            1.0,
            BuildOptions {
                replace_existing: false,
            },
        )
        .await;

    assert!(result.success);
    assert_eq!(store.rows().len(), 2);
}
