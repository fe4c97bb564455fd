// ==========================================
// 学员档案系统 - 导入模块错误类型
// ==========================================
// 范围: 仅整次运行失败（致命）；行级问题记入 ImportResult.errors
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("unsupported format: {0}, expected csv or xlsx")]
    UnsupportedFormat(String),

    #[error("failed to parse file: {0}")]
    CsvParseError(String),

    #[error("failed to parse file: {0}")]
    ExcelParseError(String),

    #[error("failed to parse file: no sheets found in xlsx file")]
    NoWorksheet,

    // ===== 表头错误 =====
    #[error("file must have a header row and at least one data row")]
    NotEnoughRows,

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    // ===== 数据库错误 =====
    #[error("failed to check existing {what}: {source}")]
    PreCheckFailed {
        what: &'static str,
        #[source]
        source: RepositoryError,
    },

    #[error("failed to read import configuration: {0}")]
    ConfigReadError(#[source] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImporterResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = ImportError::MissingColumns(vec!["status".into(), "cohort".into()]);
        assert_eq!(err.to_string(), "missing required columns: status, cohort");
    }

    #[test]
    fn test_not_enough_rows_message() {
        assert_eq!(
            ImportError::NotEnoughRows.to_string(),
            "file must have a header row and at least one data row"
        );
    }
}
