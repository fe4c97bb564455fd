// ==========================================
// 学员档案系统 - 导入 API
// ==========================================
// 职责: 按文件名识别格式、执行导入、生成汇总消息
// ==========================================

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::domain::import::ImportResult;
use crate::importer::{FileFormat, StudentImporter};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 汇总消息: "Import completed: X created, Y errors"
    pub message: String,
    /// 逐行结果
    pub result: ImportResult,
}

impl ImportApiResponse {
    pub fn from_result(result: ImportResult) -> Self {
        let message = format!(
            "Import completed: {} created, {} errors",
            result.created,
            result.errors.len()
        );
        Self { message, result }
    }
}

/// 导入API
pub struct ImportApi {
    importer: Arc<dyn StudentImporter>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(importer: Arc<dyn StudentImporter>) -> Self {
        Self { importer }
    }

    /// 导入学员数据
    ///
    /// # 参数
    /// - file_name: 原始文件名（以 .csv / .xlsx 识别格式）
    /// - data: 文件内容
    /// - acting_user: 操作人
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 汇总消息 + 逐行结果
    /// - Err(ApiError): 格式不支持或整次导入失败
    pub async fn import_students(
        &self,
        file_name: &str,
        data: &[u8],
        acting_user: Option<Uuid>,
    ) -> ApiResult<ImportApiResponse> {
        self.import_students_cancellable(file_name, data, acting_user, None)
            .await
    }

    /// 同 import_students，可通过 cancel 中途停止
    pub async fn import_students_cancellable(
        &self,
        file_name: &str,
        data: &[u8],
        acting_user: Option<Uuid>,
        cancel: Option<&AtomicBool>,
    ) -> ApiResult<ImportApiResponse> {
        let format = FileFormat::from_file_name(file_name)?;
        info!(file_name, format = %format, "收到导入请求");

        let result = self
            .importer
            .import_cancellable(data, format, acting_user, cancel)
            .await?;

        Ok(ImportApiResponse::from_result(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::ImportRowError;

    #[test]
    fn test_summary_message() {
        let result = ImportResult {
            total_rows: 3,
            created: 2,
            errors: vec![
                ImportRowError::new(3, "email", "x", "invalid email format"),
                ImportRowError::new(3, "status", "", "required field is empty"),
            ],
            cancelled: false,
        };
        let response = ImportApiResponse::from_result(result);
        assert_eq!(response.message, "Import completed: 2 created, 2 errors");
        assert_eq!(response.result.total_rows, 3);
    }
}
