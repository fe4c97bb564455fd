// ==========================================
// 学员档案系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 学员 CRUD 与表格批量导入后端
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 服务层 - 单实体业务规则
pub mod service;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CatalogKind, CreateStudentRequest, Gender, ImportResult, ImportRowError, Student,
    StudentFilters, StudentStatus, UpdateStudentRequest,
};

// API
pub use api::{ImportApi, StudentApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "student-registry";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
