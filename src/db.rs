// ==========================================
// 学员档案系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建表语句，CLI/测试/API 共用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）
///
/// - 目录表以 name_key（折叠后的名称）做作用域内唯一约束
/// - emails/phones 为 JSON 数组文本
/// - document_id 仅在未删除学员中唯一
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS countries (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS cities (
            id TEXT PRIMARY KEY,
            country_id TEXT NOT NULL REFERENCES countries(id),
            name TEXT NOT NULL,
            name_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (country_id, name_key)
        );

        CREATE TABLE IF NOT EXISTS professions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS job_title_categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS universities (
            id TEXT PRIMARY KEY,
            country_id TEXT NOT NULL REFERENCES countries(id),
            city_id TEXT REFERENCES cities(id),
            name TEXT NOT NULL,
            name_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (country_id, name_key)
        );

        CREATE TABLE IF NOT EXISTS students (
            id TEXT PRIMARY KEY,
            first_names TEXT NOT NULL,
            last_names TEXT NOT NULL,
            document_id TEXT,
            birth_date TEXT,
            profile_photo_url TEXT,
            gender TEXT CHECK (gender IN ('M', 'F')),
            nationality_country_id TEXT NOT NULL REFERENCES countries(id),
            residence_country_id TEXT NOT NULL REFERENCES countries(id),
            residence_city_id TEXT REFERENCES cities(id),
            emails TEXT NOT NULL DEFAULT '[]',
            phones TEXT NOT NULL DEFAULT '[]',
            company_id TEXT,
            job_title_category_id TEXT REFERENCES job_title_categories(id),
            profession_id TEXT REFERENCES professions(id),
            student_code TEXT,
            status TEXT NOT NULL,
            cohort TEXT NOT NULL,
            enrollment_date TEXT NOT NULL,
            graduation_date TEXT,
            created_at TEXT NOT NULL,
            created_by TEXT,
            updated_at TEXT NOT NULL,
            updated_by TEXT,
            deleted_at TEXT,
            deleted_by TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_students_document_live
            ON students(document_id)
            WHERE document_id IS NOT NULL AND deleted_at IS NULL;

        CREATE INDEX IF NOT EXISTS idx_students_enrollment
            ON students(enrollment_date);

        CREATE TABLE IF NOT EXISTS student_universities (
            student_id TEXT NOT NULL REFERENCES students(id),
            university_id TEXT NOT NULL REFERENCES universities(id),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (student_id, university_id)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
