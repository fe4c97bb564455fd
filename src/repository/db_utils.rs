// ==========================================
// 学员档案系统 - 仓储层数据库工具
// ==========================================
// 职责: IN 子句构建、分块、UUID/日期列解析
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

/// 单条 IN 查询的最大占位符数（低于 SQLITE_MAX_VARIABLE_NUMBER）
pub const IN_CLAUSE_CHUNK_SIZE: usize = 500;

/// 构建 IN 子句片段，例如 "document_id IN (?, ?, ?)"
///
/// 空列表返回永假条件 "1 = 0"
pub fn build_in_clause<T: AsRef<str>>(column_name: &str, values: &[T]) -> String {
    if values.is_empty() {
        return "1 = 0".to_string();
    }

    let placeholders = values.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    format!("{} IN ({})", column_name, placeholders)
}

/// 解析 TEXT 列中的 UUID
pub fn uuid_from_column(idx: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 解析可空 TEXT 列中的 UUID
pub fn opt_uuid_from_column(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<Uuid>> {
    raw.map(|s| uuid_from_column(idx, &s)).transpose()
}

/// 解析 YYYY-MM-DD 日期列
pub fn date_from_column(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 解析 RFC3339 时间戳列
pub fn timestamp_from_column(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
