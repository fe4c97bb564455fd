// ==========================================
// 学员档案系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 连接: 所有仓储与配置共享同一个 SQLite 连接
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{ImportApi, StudentApi};
use crate::config::{ConfigManager, ImportConfigReader, StudentRulesReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::{StudentImporter, StudentImporterImpl};
use crate::repository::{
    CatalogRepository, CatalogRepositoryImpl, StudentRepository, StudentRepositoryImpl,
};
use crate::service::{StudentService, StudentServiceImpl};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "STUDENT_REGISTRY_DB";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 学员API
    pub student_api: Arc<StudentApi>,

    /// 学员导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理器（用于 CLI 读写配置）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 打开连接并建表（幂等），然后自底向上装配仓储 → 服务 → 导入器 → API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("failed to open database: {}", e))?;
        init_schema(&conn).map_err(|e| format!("failed to initialize schema: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let student_repo: Arc<dyn StudentRepository> =
            Arc::new(StudentRepositoryImpl::from_connection(conn.clone()));
        let catalog_repo: Arc<dyn CatalogRepository> =
            Arc::new(CatalogRepositoryImpl::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("failed to create ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Service层
        // ==========================================
        let rules: Arc<dyn StudentRulesReader> = config_manager.clone();
        let student_service: Arc<dyn StudentService> =
            Arc::new(StudentServiceImpl::new(student_repo.clone(), rules));

        let import_config: Arc<dyn ImportConfigReader> = config_manager.clone();
        let importer: Arc<dyn StudentImporter> = Arc::new(StudentImporterImpl::new(
            student_service.clone(),
            student_repo,
            catalog_repo,
            import_config,
        ));

        // ==========================================
        // 创建API实例
        // ==========================================
        let student_api = Arc::new(StudentApi::new(student_service));
        let import_api = Arc::new(ImportApi::new(importer));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            student_api,
            import_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 STUDENT_REGISTRY_DB → <用户数据目录>/student-registry/registry.db → ./registry.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./registry.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("student-registry");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("registry.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_initializes_schema() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);

        let conn = open_sqlite_connection(&db_path).unwrap();
        assert_eq!(
            crate::db::read_schema_version(&conn).unwrap(),
            Some(crate::db::CURRENT_SCHEMA_VERSION)
        );
    }
}
