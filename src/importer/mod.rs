// ==========================================
// 学员档案系统 - 导入层
// ==========================================
// 职责: 外部表格文件 → 学员记录
// 支持: CSV, Excel (xlsx)
// ==========================================

// 模块声明
pub mod catalog_resolver;
pub mod conflict_handler;
pub mod data_cleaner;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod student_importer_impl;
pub mod student_importer_trait;

// 重导出核心类型
pub use catalog_resolver::CatalogResolver;
pub use conflict_handler::ConflictHandler;
pub use data_cleaner::DataCleaner;
pub use dq_validator::DqValidator;
pub use error::{ImportError, ImporterResult};
pub use field_mapper::{FieldMapper, HeaderMap, RawStudentRow};
pub use file_parser::{CsvParser, ExcelParser, FileFormat, ParsedRow, UniversalFileParser};
pub use student_importer_impl::StudentImporterImpl;

// 重导出 Trait 接口
pub use student_importer_trait::{FileParser, StudentImporter};
