// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================
#![allow(dead_code)]

use chrono::NaiveDate;
use media_plan_budget::domain::line::{Creative, MediaLine, Moment, MonthlyBudget};

/// 日期简写
pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==========================================
// MediaLine 构建器
// ==========================================

pub struct MediaLineBuilder {
    line: MediaLine,
}

impl MediaLineBuilder {
    pub fn new(line_id: &str, plan_id: &str) -> Self {
        Self {
            line: MediaLine::new(line_id, plan_id, 0.0),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.line.line_name = name.to_string();
        self
    }

    pub fn budget(mut self, budget: f64) -> Self {
        self.line.budget = budget;
        self
    }

    pub fn subdivision(mut self, id: &str) -> Self {
        self.line.subdivision_id = Some(id.to_string());
        self
    }

    pub fn moment(mut self, id: &str) -> Self {
        self.line.moment_id = Some(id.to_string());
        self
    }

    pub fn funnel_stage(mut self, id: &str) -> Self {
        self.line.funnel_stage_id = Some(id.to_string());
        self
    }

    pub fn dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.line.start_date = Some(start);
        self.line.end_date = Some(end);
        self
    }

    /// 设置完整且已校验的 UTM
    pub fn tracked(mut self) -> Self {
        self.line.utm_source = Some("google".to_string());
        self.line.utm_medium = Some("cpc".to_string());
        self.line.utm_campaign = Some("spring".to_string());
        self.line.utm_validated = true;
        self
    }

    pub fn build(self) -> MediaLine {
        self.line
    }
}

// ==========================================
// 关联实体构建函数
// ==========================================

pub fn creative(creative_id: &str, line_id: &str, format_id: Option<&str>) -> Creative {
    Creative {
        creative_id: creative_id.to_string(),
        line_id: line_id.to_string(),
        creative_name: format!("素材 {}", creative_id),
        format_id: format_id.map(|f| f.to_string()),
    }
}

pub fn monthly(line_id: &str, month: NaiveDate, amount: f64) -> MonthlyBudget {
    MonthlyBudget {
        line_id: line_id.to_string(),
        month,
        amount,
    }
}

pub fn moment(
    moment_id: &str,
    plan_id: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Moment {
    Moment {
        moment_id: moment_id.to_string(),
        plan_id: plan_id.to_string(),
        moment_name: format!("时段 {}", moment_id),
        start_date: start,
        end_date: end,
    }
}
