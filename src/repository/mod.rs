// ==========================================
// 学员档案系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有值均参数化绑定（表名仅来自 CatalogKind 常量）
// ==========================================

pub mod catalog_repo;
pub mod db_utils;
pub mod error;
pub mod student_repo;

// 重导出核心仓储
pub use catalog_repo::{CatalogRepository, CatalogRepositoryImpl};
pub use error::{RepositoryError, RepositoryResult};
pub use student_repo::{StudentRepository, StudentRepositoryImpl};
