// ==========================================
// 学员档案系统 - 学员导入 Trait
// ==========================================
// 职责: 定义学员批量导入接口与文件解析接口（不包含实现）
// ==========================================

use crate::domain::import::ImportResult;
use crate::importer::error::ImporterResult;
use crate::importer::file_parser::{FileFormat, ParsedRow};
use async_trait::async_trait;
use std::sync::atomic::AtomicBool;
use uuid::Uuid;

// ==========================================
// StudentImporter Trait
// ==========================================
// 实现者: StudentImporterImpl
#[async_trait]
pub trait StudentImporter: Send + Sync {
    /// 从文件字节导入学员
    ///
    /// # 参数
    /// - data: 文件内容
    /// - format: csv / xlsx
    /// - acting_user: 操作人（写入 created_by）
    ///
    /// # 返回
    /// - Ok(ImportResult): 逐行结果汇总（行级错误在 errors 中）
    /// - Err(ImportError): 整次运行失败（格式/解析/表头/预检查）
    ///
    /// # 导入流程
    /// 1. 文件解析
    /// 2. 表头映射与必填列校验
    /// 3. 证件号/邮箱批量预检查
    /// 4. 逐行: 校验 → 重复检测 → 目录解析 → 创建 → 大学关联
    /// 5. 汇总
    async fn import_from_bytes(
        &self,
        data: &[u8],
        format: FileFormat,
        acting_user: Option<Uuid>,
    ) -> ImporterResult<ImportResult> {
        self.import_cancellable(data, format, acting_user, None).await
    }

    /// 同 import_from_bytes，每行处理前检查取消标记
    ///
    /// 取消后返回已处理行的结果，cancelled = true
    async fn import_cancellable(
        &self,
        data: &[u8],
        format: FileFormat,
        acting_user: Option<Uuid>,
        cancel: Option<&AtomicBool>,
    ) -> ImporterResult<ImportResult>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析为行列表；首行为表头，之后的完全空白行已剔除
    fn parse_rows(&self, data: &[u8]) -> ImporterResult<Vec<ParsedRow>>;
}
