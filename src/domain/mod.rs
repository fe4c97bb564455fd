// ==========================================
// 学员档案系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、请求 DTO
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod catalog;
pub mod import;
pub mod student;

// 重导出核心类型
pub use catalog::{catalog_name_key, derive_country_code, CatalogKind, NewCatalogEntry};
pub use import::{ImportResult, ImportRowError, ROW_LEVEL_FIELD};
pub use student::{
    is_valid_email, is_valid_student_code, CreateStudentRequest, Gender, Student,
    StudentFilters, StudentStatus, UpdateStudentRequest, STUDENT_CODE_FORMAT_MESSAGE,
};
