// ==========================================
// 学员档案系统 - 服务层错误类型
// ==========================================
// 说明: Validation/Conflict 的 Display 即面向用户的原因文本，
//       导入流水线将其原样写入行级错误
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("student not found: {0}")]
    NotFound(Uuid),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

/// Result 类型别名
pub type ServiceResult<T> = Result<T, ServiceError>;
