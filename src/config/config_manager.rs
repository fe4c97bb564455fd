// ==========================================
// 学员档案系统 - 配置管理器
// ==========================================
// 职责: 配置查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{
    default_status_aliases, ImportConfigReader, StudentRulesReader,
};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 解析数值配置；格式错误时记录告警并回退默认值
    fn get_parsed_or_default<T: std::str::FromStr>(
        &self,
        key: &str,
        default: T,
    ) -> RepositoryResult<T> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key = key, value = %raw, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_residence_country_fallback(&self) -> RepositoryResult<bool> {
        let value = self.get_config_or_default(config_keys::RESIDENCE_COUNTRY_FALLBACK, "true")?;
        match value.trim().to_lowercase().as_str() {
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Ok(true),
        }
    }

    async fn get_status_aliases(&self) -> RepositoryResult<HashMap<String, String>> {
        let raw = match self.get_config_value(config_keys::STATUS_ALIASES)? {
            Some(v) => v,
            None => return Ok(default_status_aliases()),
        };

        match serde_json::from_str::<HashMap<String, String>>(&raw) {
            Ok(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_lowercase()))
                .collect()),
            Err(e) => {
                warn!(error = %e, "status_aliases 配置无法解析，使用默认别名表");
                Ok(default_status_aliases())
            }
        }
    }
}

#[async_trait]
impl StudentRulesReader for ConfigManager {
    async fn get_min_age(&self) -> RepositoryResult<u32> {
        self.get_parsed_or_default(config_keys::STUDENT_MIN_AGE, 18)
    }

    async fn get_list_default_limit(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(config_keys::LIST_DEFAULT_LIMIT, 20)
    }

    async fn get_list_max_limit(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(config_keys::LIST_MAX_LIMIT, 100)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入
    pub const RESIDENCE_COUNTRY_FALLBACK: &str = "import.residence_country_fallback";
    pub const STATUS_ALIASES: &str = "import.status_aliases"; // JSON 对象

    // 学员
    pub const STUDENT_MIN_AGE: &str = "student.min_age";
    pub const LIST_DEFAULT_LIMIT: &str = "student.list_default_limit";
    pub const LIST_MAX_LIMIT: &str = "student.list_max_limit";
}
