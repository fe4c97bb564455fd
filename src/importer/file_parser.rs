// ==========================================
// 学员档案系统 - 文件解析器实现
// ==========================================
// 阶段 1: 字节流 → 行（字符串单元格）
// 支持: CSV / Excel (.xlsx，首个工作表)
// 行号: 1 起始，表头为第 1 行；完全空白的数据行被跳过但保留原行号
// ==========================================

use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::student_importer_trait::FileParser;
use calamine::{Data, DataType, Reader, Xlsx};
use csv::{ReaderBuilder, Trim};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

// ==========================================
// FileFormat - 上传文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// 按文件扩展名识别格式（大小写不敏感）
    pub fn from_file_name(file_name: &str) -> ImporterResult<Self> {
        let ext = std::path::Path::new(file_name.trim())
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        ext.parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for FileFormat {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// ParsedRow - 解析后的行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    /// 文件中的原始行号（表头为 1）
    pub row_number: usize,
    pub cells: Vec<String>,
}

impl ParsedRow {
    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// 保留表头（第一行），丢弃之后完全空白的行
fn drop_blank_data_rows(rows: Vec<ParsedRow>) -> Vec<ParsedRow> {
    rows.into_iter()
        .enumerate()
        .filter(|(idx, row)| *idx == 0 || !row.is_blank())
        .map(|(_, row)| row)
        .collect()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_rows(&self, data: &[u8]) -> ImporterResult<Vec<ParsedRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .trim(Trim::All)
            .from_reader(data);

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            rows.push(ParsedRow {
                row_number: idx + 1,
                cells: record.iter().map(str::to_string).collect(),
            });
        }

        Ok(drop_blank_data_rows(rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 单元格转字符串
    ///
    /// - 日期单元格 → YYYY-MM-DD
    /// - 整数值浮点（证件号等）去掉小数部分
    fn cell_to_string(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.trim().to_string(),
            Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Data::DateTime(_) | Data::DateTimeIso(_) => cell
                .as_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| cell.to_string()),
            other => other.to_string().trim().to_string(),
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_rows(&self, data: &[u8]) -> ImporterResult<Vec<ParsedRow>> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ImportError::NoWorksheet)??;

        // 已用区域从第一个非空单元格开始，行号需加上其起始偏移
        let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);

        let rows = range
            .rows()
            .enumerate()
            .map(|(idx, cells)| ParsedRow {
                row_number: first_row + idx + 1,
                cells: cells.iter().map(Self::cell_to_string).collect(),
            })
            .collect();

        Ok(drop_blank_data_rows(rows))
    }
}

// ==========================================
// 通用文件解析器（按格式选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parser_for(format: FileFormat) -> Box<dyn FileParser> {
        match format {
            FileFormat::Csv => Box::new(CsvParser),
            FileFormat::Xlsx => Box::new(ExcelParser),
        }
    }

    pub fn parse(&self, data: &[u8], format: FileFormat) -> ImporterResult<Vec<ParsedRow>> {
        Self::parser_for(format).parse_rows(data)
    }
}
