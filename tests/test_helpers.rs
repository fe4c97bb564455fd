// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 导入端到端场景使用的表头
pub const BASIC_HEADER: &str =
    "first_names,last_names,nationality_country_id,status,cohort,enrollment_date,email";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = student_registry::db::open_sqlite_connection(&db_path)?;
    student_registry::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入一条全局配置
pub fn insert_test_config(db_path: &str, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let conn = Connection::open(db_path)?;
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

/// 统计表行数
pub fn count_rows(db_path: &str, table: &str) -> i64 {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}

/// 按行拼接 CSV 内容
pub fn csv_bytes(lines: &[&str]) -> Vec<u8> {
    let mut out = lines.join("\n");
    out.push('\n');
    out.into_bytes()
}
