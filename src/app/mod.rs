// ==========================================
// 学员档案系统 - 应用层
// ==========================================
// 职责: 组件装配，连接 CLI 与后端
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
