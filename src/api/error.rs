// ==========================================
// 学员档案系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将仓储/服务/导入错误转换为面向用户的消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use crate::service::error::ServiceError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("import failed: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {}", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("failed to acquire lock: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::InvalidInput(format!("referenced record does not exist: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("{}: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ServiceError 转换
// ==========================================
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::InvalidInput(msg),
            ServiceError::NotFound(id) => ApiError::NotFound(format!("student {}", id)),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Repository(e) => e.into(),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnsupportedFormat(_) => ApiError::InvalidInput(err.to_string()),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Student".to_string(),
            id: "S001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Student"));
                assert!(msg.contains("S001"));
            }
            _ => panic!("Expected NotFound"),
        }

        let repo_err = RepositoryError::UniqueConstraintViolation("countries.code".to_string());
        assert!(matches!(ApiError::from(repo_err), ApiError::Conflict(_)));

        let repo_err = RepositoryError::LockError("poisoned".to_string());
        assert_eq!(
            ApiError::from(repo_err).to_string(),
            "database connection failed: failed to acquire lock: poisoned"
        );
    }

    #[test]
    fn test_service_error_conversion() {
        let api_err: ApiError = ServiceError::validation("status is required").into();
        assert_eq!(api_err.to_string(), "invalid input: status is required");

        let id = Uuid::new_v4();
        let api_err: ApiError = ServiceError::NotFound(id).into();
        assert!(matches!(api_err, ApiError::NotFound(ref m) if m.contains(&id.to_string())));
    }

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::UnsupportedFormat(".txt".to_string()).into();
        assert!(matches!(api_err, ApiError::InvalidInput(_)));

        let api_err: ApiError =
            ImportError::MissingColumns(vec!["status".to_string(), "cohort".to_string()]).into();
        assert_eq!(
            api_err.to_string(),
            "import failed: missing required columns: status, cohort"
        );
    }
}
