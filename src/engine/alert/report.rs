use crate::domain::alert::PlanAlert;
use crate::domain::types::{AlertCategory, AlertLevel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// PlanAlertReport - 告警评估报告
// ==========================================
// 分级/分类/按行视图均由 alerts 派生, 不单独计算
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanAlertReport {
    /// 规则注册顺序下的告警 (已按 id 去重)
    pub alerts: Vec<PlanAlert>,
}

impl PlanAlertReport {
    pub fn new(alerts: Vec<PlanAlert>) -> Self {
        Self { alerts }
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// 按 id 查找
    pub fn get(&self, id: &str) -> Option<&PlanAlert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// 按级别分组
    pub fn by_level(&self) -> BTreeMap<AlertLevel, Vec<&PlanAlert>> {
        let mut grouped: BTreeMap<AlertLevel, Vec<&PlanAlert>> = BTreeMap::new();
        for alert in &self.alerts {
            grouped.entry(alert.level).or_default().push(alert);
        }
        grouped
    }

    /// 按类别分组
    pub fn by_category(&self) -> BTreeMap<AlertCategory, Vec<&PlanAlert>> {
        let mut grouped: BTreeMap<AlertCategory, Vec<&PlanAlert>> = BTreeMap::new();
        for alert in &self.alerts {
            grouped.entry(alert.category).or_default().push(alert);
        }
        grouped
    }

    /// 指定级别的告警数
    pub fn count(&self, level: AlertLevel) -> usize {
        self.alerts.iter().filter(|a| a.level == level).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(AlertLevel::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(AlertLevel::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(AlertLevel::Info)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 指定投放行的告警
    pub fn alerts_for_line(&self, line_id: &str) -> Vec<&PlanAlert> {
        self.alerts
            .iter()
            .filter(|a| a.line_id.as_deref() == Some(line_id))
            .collect()
    }

    /// 至少有一条告警的投放行
    pub fn lines_with_alerts(&self) -> BTreeSet<&str> {
        self.alerts
            .iter()
            .filter_map(|a| a.line_id.as_deref())
            .collect()
    }

    /// 按严重程度排序 (Error 在前, 同级保持原顺序)
    pub fn sorted_by_severity(&self) -> Vec<&PlanAlert> {
        let mut sorted: Vec<&PlanAlert> = self.alerts.iter().collect();
        sorted.sort_by_key(|a| a.level);
        sorted
    }
}
