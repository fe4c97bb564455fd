// ==========================================
// 学员档案系统 - 字段映射器实现
// ==========================================
// 阶段 2: 表头 → 列位置映射，行 → RawStudentRow
// 表头: 小写、去空白、去 BOM；列顺序无关
// ==========================================

use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::file_parser::ParsedRow;
use std::collections::HashMap;

/// 识别的列名
pub mod columns {
    pub const FIRST_NAMES: &str = "first_names";
    pub const LAST_NAMES: &str = "last_names";
    pub const DOCUMENT_ID: &str = "document_id";
    pub const BIRTH_DATE: &str = "birth_date";
    pub const GENDER: &str = "gender";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const NATIONALITY_COUNTRY_ID: &str = "nationality_country_id";
    pub const RESIDENCE_COUNTRY_ID: &str = "residence_country_id";
    pub const RESIDENCE_CITY_ID: &str = "residence_city_id";
    pub const COMPANY_ID: &str = "company_id";
    pub const JOB_TITLE_CATEGORY_ID: &str = "job_title_category_id";
    pub const PROFESSION_ID: &str = "profession_id";
    pub const STUDENT_CODE: &str = "student_code";
    pub const STATUS: &str = "status";
    pub const COHORT: &str = "cohort";
    pub const ENROLLMENT_DATE: &str = "enrollment_date";

    // 大学关联（可选）
    pub const UNIVERSITY: &str = "universidad";
    pub const UNIVERSITY_CITY: &str = "universidad-ciudad";
    pub const UNIVERSITY_COUNTRY: &str = "universidad-pais";

    /// 始终必填的列
    pub const REQUIRED: [&str; 6] = [
        FIRST_NAMES,
        LAST_NAMES,
        NATIONALITY_COUNTRY_ID,
        STATUS,
        COHORT,
        ENROLLMENT_DATE,
    ];
}

// ==========================================
// HeaderMap - 列名 → 列位置
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    index: HashMap<String, usize>,
}

impl HeaderMap {
    /// 由表头行构建；重复列名以最后一次出现为准
    pub fn from_header_row(cells: &[String]) -> Self {
        let index = cells
            .iter()
            .enumerate()
            .map(|(i, h)| (Self::normalize(h), i))
            .collect();
        Self { index }
    }

    fn normalize(header: &str) -> String {
        header.trim_start_matches('\u{feff}').trim().to_lowercase()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// 校验必填列，返回按给定顺序排列的缺失列
    ///
    /// # 参数
    /// - require_residence: 居住国回退关闭时为 true
    pub fn require_columns(&self, require_residence: bool) -> ImporterResult<()> {
        let mut required: Vec<&str> = columns::REQUIRED.to_vec();
        if require_residence {
            required.push(columns::RESIDENCE_COUNTRY_ID);
        }

        let missing: Vec<String> = required
            .into_iter()
            .filter(|c| !self.contains(c))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingColumns(missing))
        }
    }

    /// 取单元格（列缺失或行过短时为空串），已去空白
    pub fn get<'a>(&self, row: &'a ParsedRow, column: &str) -> &'a str {
        self.index
            .get(column)
            .and_then(|&i| row.cells.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }
}

// ==========================================
// RawStudentRow - 映射后的行（全部为去空白字符串）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStudentRow {
    pub row_number: usize,
    pub first_names: String,
    pub last_names: String,
    pub document_id: String,
    pub birth_date: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub nationality: String,
    pub residence_country: String,
    pub residence_city: String,
    pub company_id: String,
    pub job_title_category: String,
    pub profession: String,
    pub student_code: String,
    /// 已经过别名映射
    pub status: String,
    pub cohort: String,
    pub enrollment_date: String,
    pub university: String,
    pub university_city: String,
    pub university_country: String,
}

pub struct FieldMapper<'a> {
    headers: &'a HeaderMap,
    cleaner: &'a DataCleaner,
}

impl<'a> FieldMapper<'a> {
    pub fn new(headers: &'a HeaderMap, cleaner: &'a DataCleaner) -> Self {
        Self { headers, cleaner }
    }

    pub fn map_row(&self, row: &ParsedRow) -> RawStudentRow {
        let get = |column: &str| self.headers.get(row, column).to_string();

        RawStudentRow {
            row_number: row.row_number,
            first_names: get(columns::FIRST_NAMES),
            last_names: get(columns::LAST_NAMES),
            document_id: get(columns::DOCUMENT_ID),
            birth_date: get(columns::BIRTH_DATE),
            gender: get(columns::GENDER),
            email: get(columns::EMAIL),
            phone: get(columns::PHONE),
            nationality: get(columns::NATIONALITY_COUNTRY_ID),
            residence_country: get(columns::RESIDENCE_COUNTRY_ID),
            residence_city: get(columns::RESIDENCE_CITY_ID),
            company_id: get(columns::COMPANY_ID),
            job_title_category: get(columns::JOB_TITLE_CATEGORY_ID),
            profession: get(columns::PROFESSION_ID),
            student_code: get(columns::STUDENT_CODE),
            status: self
                .cleaner
                .normalize_status(self.headers.get(row, columns::STATUS)),
            cohort: get(columns::COHORT),
            enrollment_date: get(columns::ENROLLMENT_DATE),
            university: get(columns::UNIVERSITY),
            university_city: get(columns::UNIVERSITY_CITY),
            university_country: get(columns::UNIVERSITY_COUNTRY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_status_aliases;

    fn row(n: usize, cells: &[&str]) -> ParsedRow {
        ParsedRow {
            row_number: n,
            cells: cells.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_header_normalization() {
        let headers = HeaderMap::from_header_row(&[
            "\u{feff}First_Names".to_string(),
            "  LAST_NAMES ".to_string(),
        ]);
        assert!(headers.contains("first_names"));
        assert!(headers.contains("last_names"));
    }

    #[test]
    fn test_missing_columns_in_required_order() {
        let headers = HeaderMap::from_header_row(&[
            "first_names".to_string(),
            "last_names".to_string(),
            "nationality_country_id".to_string(),
        ]);

        let err = headers.require_columns(false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required columns: status, cohort, enrollment_date"
        );

        let err = headers.require_columns(true).unwrap_err();
        assert!(err.to_string().ends_with("enrollment_date, residence_country_id"));
    }

    #[test]
    fn test_map_row_short_row_and_status_alias() {
        let header = row(1, &["status", "first_names", "email"]);
        let headers = HeaderMap::from_header_row(&header.cells);
        let cleaner = DataCleaner::new(default_status_aliases());
        let mapper = FieldMapper::new(&headers, &cleaner);

        let mapped = mapper.map_row(&row(2, &[" Activo ", " Ana "]));
        assert_eq!(mapped.row_number, 2);
        assert_eq!(mapped.status, "active");
        assert_eq!(mapped.first_names, "Ana");
        assert_eq!(mapped.email, "");
        assert_eq!(mapped.cohort, "");
    }
}
