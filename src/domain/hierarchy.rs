// ==========================================
// 媒体计划预算核心 - 层级配置领域模型
// ==========================================
// 职责: 定义计划启用的层级维度、顺序、分配方式
// 红线: 最多 3 个层级, 不允许重复; 所有变更为纯函数, 返回新配置
// ==========================================

use crate::domain::distribution::{distribution_depths, BudgetDistribution};
use crate::domain::types::HierarchyLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 层级数量上限
pub const MAX_HIERARCHY_LEVELS: usize = 3;

// ==========================================
// HierarchyConfigError - 层级配置错误
// ==========================================
// 在任何存储交互之前同步拒绝
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyConfigError {
    #[error("层级重复: {0}")]
    DuplicateLevel(HierarchyLevel),

    #[error("层级数量超限: 最多 {max} 个, 实际 {actual} 个")]
    TooManyLevels { max: usize, actual: usize },

    #[error("层级未配置: {0}")]
    LevelNotConfigured(HierarchyLevel),

    #[error("层级位置越界: index={index}, len={len}")]
    PositionOutOfRange { index: usize, len: usize },

    #[error("层级配置解析失败: {0}")]
    Parse(String),
}

// ==========================================
// HierarchyLevelConfig - 单个层级配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLevelConfig {
    pub level: HierarchyLevel,
    /// true = 用户直接设定该层金额; false = 由下属投放行汇总计算
    #[serde(default = "default_allocate_budget", alias = "allocateBudget")]
    pub allocate_budget: bool,
}

fn default_allocate_budget() -> bool {
    true
}

impl HierarchyLevelConfig {
    pub fn new(level: HierarchyLevel, allocate_budget: bool) -> Self {
        Self {
            level,
            allocate_budget,
        }
    }
}

/// 兼容旧格式: 既接受裸层级字符串, 也接受完整配置对象
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawHierarchyEntry {
    Bare(HierarchyLevel),
    Full(HierarchyLevelConfig),
}

impl From<RawHierarchyEntry> for HierarchyLevelConfig {
    fn from(raw: RawHierarchyEntry) -> Self {
        match raw {
            RawHierarchyEntry::Bare(level) => HierarchyLevelConfig::new(level, true),
            RawHierarchyEntry::Full(config) => config,
        }
    }
}

// ==========================================
// HierarchyOrder - 计划层级顺序
// ==========================================
// 第一个 = 最外层 (depth 0)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<RawHierarchyEntry>",
    into = "Vec<HierarchyLevelConfig>"
)]
pub struct HierarchyOrder {
    configs: Vec<HierarchyLevelConfig>,
}

impl TryFrom<Vec<RawHierarchyEntry>> for HierarchyOrder {
    type Error = HierarchyConfigError;

    fn try_from(raw: Vec<RawHierarchyEntry>) -> Result<Self, Self::Error> {
        HierarchyOrder::new(raw.into_iter().map(HierarchyLevelConfig::from).collect())
    }
}

impl From<HierarchyOrder> for Vec<HierarchyLevelConfig> {
    fn from(order: HierarchyOrder) -> Self {
        order.configs
    }
}

impl HierarchyOrder {
    /// 校验并创建层级顺序
    pub fn new(configs: Vec<HierarchyLevelConfig>) -> Result<Self, HierarchyConfigError> {
        if configs.len() > MAX_HIERARCHY_LEVELS {
            return Err(HierarchyConfigError::TooManyLevels {
                max: MAX_HIERARCHY_LEVELS,
                actual: configs.len(),
            });
        }

        for (i, config) in configs.iter().enumerate() {
            if configs[..i].iter().any(|c| c.level == config.level) {
                return Err(HierarchyConfigError::DuplicateLevel(config.level));
            }
        }

        Ok(Self { configs })
    }

    /// 空层级 (计划使用单一未拆分预算)
    pub fn empty() -> Self {
        Self::default()
    }

    /// 旧格式: 裸层级列表, 全部视为 allocate_budget = true
    pub fn from_levels(levels: &[HierarchyLevel]) -> Result<Self, HierarchyConfigError> {
        Self::new(
            levels
                .iter()
                .map(|&level| HierarchyLevelConfig::new(level, true))
                .collect(),
        )
    }

    /// 从 JSON 解析 (兼容裸列表和完整配置)
    pub fn from_json(raw: &str) -> Result<Self, HierarchyConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::empty());
        }
        serde_json::from_str(raw).map_err(|e| HierarchyConfigError::Parse(e.to_string()))
    }

    /// 序列化为 JSON (始终输出完整配置格式)
    pub fn to_json(&self) -> String {
        // Vec<HierarchyLevelConfig> 的序列化不会失败
        serde_json::to_string(&self.configs).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn configs(&self) -> &[HierarchyLevelConfig] {
        &self.configs
    }

    pub fn levels(&self) -> Vec<HierarchyLevel> {
        self.configs.iter().map(|c| c.level).collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn get(&self, depth: usize) -> Option<&HierarchyLevelConfig> {
        self.configs.get(depth)
    }

    pub fn contains(&self, level: HierarchyLevel) -> bool {
        self.configs.iter().any(|c| c.level == level)
    }

    /// 层级所在深度
    pub fn depth_of(&self, level: HierarchyLevel) -> Option<usize> {
        self.configs.iter().position(|c| c.level == level)
    }

    // ==========================================
    // 纯变更操作
    // ==========================================

    /// 追加层级 (放在最内层)
    pub fn add_level(
        &self,
        level: HierarchyLevel,
        allocate_budget: bool,
    ) -> Result<Self, HierarchyConfigError> {
        if self.contains(level) {
            return Err(HierarchyConfigError::DuplicateLevel(level));
        }
        if self.configs.len() >= MAX_HIERARCHY_LEVELS {
            return Err(HierarchyConfigError::TooManyLevels {
                max: MAX_HIERARCHY_LEVELS,
                actual: self.configs.len() + 1,
            });
        }

        let mut configs = self.configs.clone();
        configs.push(HierarchyLevelConfig::new(level, allocate_budget));
        Ok(Self { configs })
    }

    /// 移除层级
    ///
    /// 已有分配树随之失效, 由调用方负责重建
    pub fn remove_level(&self, level: HierarchyLevel) -> Result<Self, HierarchyConfigError> {
        if !self.contains(level) {
            return Err(HierarchyConfigError::LevelNotConfigured(level));
        }

        let configs = self
            .configs
            .iter()
            .copied()
            .filter(|c| c.level != level)
            .collect();
        Ok(Self { configs })
    }

    /// 交换两个位置的层级
    pub fn swap_levels(&self, a: usize, b: usize) -> Result<Self, HierarchyConfigError> {
        let len = self.configs.len();
        for index in [a, b] {
            if index >= len {
                return Err(HierarchyConfigError::PositionOutOfRange { index, len });
            }
        }

        let mut configs = self.configs.clone();
        configs.swap(a, b);
        Ok(Self { configs })
    }

    /// 切换层级的 allocate_budget 标志
    pub fn toggle_allocate_budget(
        &self,
        level: HierarchyLevel,
    ) -> Result<Self, HierarchyConfigError> {
        let depth = self
            .depth_of(level)
            .ok_or(HierarchyConfigError::LevelNotConfigured(level))?;

        let mut configs = self.configs.clone();
        configs[depth].allocate_budget = !configs[depth].allocate_budget;
        Ok(Self { configs })
    }

    /// 判断已有分配树是否与当前层级顺序不一致
    ///
    /// 以下任一情况视为过期:
    /// - 任一节点的层级未配置, 或其深度与配置深度不符
    /// - 树的层数与配置层级数不符 (如新增了层级)
    /// - 已配置层级且计划有投放行, 但树为空
    ///
    /// line_count 为计划当前投放行数量
    pub fn is_stale_for(&self, distributions: &[BudgetDistribution], line_count: usize) -> bool {
        if distributions.is_empty() {
            return !self.is_empty() && line_count > 0;
        }

        let depths = distribution_depths(distributions);
        let misplaced = distributions.iter().any(|d| {
            match (
                self.depth_of(d.distribution_type),
                depths.get(&d.distribution_id),
            ) {
                (Some(expected), Some(&actual)) => expected != actual,
                _ => true,
            }
        });
        if misplaced {
            return true;
        }

        let tree_depth = depths.values().map(|d| d + 1).max().unwrap_or(0);
        tree_depth != self.len()
    }
}

// ==========================================
// HierarchyChange - 层级变更指令
// ==========================================
// 由计划编辑器提交, API 层据此生成新的层级顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HierarchyChange {
    Add {
        level: HierarchyLevel,
        allocate_budget: bool,
    },
    Remove {
        level: HierarchyLevel,
    },
    Swap {
        a: usize,
        b: usize,
    },
    ToggleAllocate {
        level: HierarchyLevel,
    },
}

impl HierarchyChange {
    /// 应用到层级顺序, 返回新顺序
    pub fn apply(&self, order: &HierarchyOrder) -> Result<HierarchyOrder, HierarchyConfigError> {
        match *self {
            HierarchyChange::Add {
                level,
                allocate_budget,
            } => order.add_level(level, allocate_budget),
            HierarchyChange::Remove { level } => order.remove_level(level),
            HierarchyChange::Swap { a, b } => order.swap_levels(a, b),
            HierarchyChange::ToggleAllocate { level } => order.toggle_allocate_budget(level),
        }
    }
}
