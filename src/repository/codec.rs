// ==========================================
// 媒体计划预算核心 - 行映射辅助
// ==========================================
// 日期统一以 ISO 文本存储: 日期 YYYY-MM-DD, 时间 YYYY-MM-DD HH:MM:SS
// ==========================================

use crate::domain::types::HierarchyLevel;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FMT).to_string())
}

pub(crate) fn datetime_to_sql(ts: NaiveDateTime) -> String {
    ts.format(DATETIME_FMT).to_string()
}

/// 列值解析失败: 错误信息带列名, 仓储层转换为 FieldValueError
fn conversion_error(row: &rusqlite::Row, idx: usize, message: String) -> rusqlite::Error {
    let stmt: &rusqlite::Statement<'_> = row.as_ref();
    let column = stmt.column_name(idx).unwrap_or("?");
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("{}: {}", column, message).into(),
    )
}

/// 读取可空日期列
pub(crate) fn get_opt_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), DATE_FMT)
            .map(Some)
            .map_err(|e| conversion_error(row, idx, format!("非法日期 {}: {}", raw, e))),
        _ => Ok(None),
    }
}

/// 读取必填日期列
pub(crate) fn get_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(raw.trim(), DATE_FMT)
        .map_err(|e| conversion_error(row, idx, format!("非法日期 {}: {}", raw, e)))
}

/// 读取时间戳列
pub(crate) fn get_datetime(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FMT)
        .map_err(|e| conversion_error(row, idx, format!("非法时间 {}: {}", raw, e)))
}

/// 读取层级列
pub(crate) fn get_level(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<HierarchyLevel> {
    let raw: String = row.get(idx)?;
    HierarchyLevel::from_str(&raw)
        .ok_or_else(|| conversion_error(row, idx, format!("未知层级: {}", raw)))
}
