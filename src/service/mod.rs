// ==========================================
// 学员档案系统 - 领域服务层
// ==========================================
// 职责: 单实体业务规则（校验 + 持久化编排）
// 红线: 不解析文件、不解析目录名称
// ==========================================

pub mod error;
pub mod student_service;

pub use error::{ServiceError, ServiceResult};
pub use student_service::{StudentService, StudentServiceImpl};
