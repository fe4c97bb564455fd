// ==========================================
// 学员档案系统 - 行数据校验器实现
// ==========================================
// 阶段 4b: 必填 / 邮箱语法 / 性别 / 无目录标识符 / 学号格式
// 说明: 一行可产生多条错误，全部返回；不做任何存储访问
// ==========================================

use crate::domain::import::ImportRowError;
use crate::domain::student::{is_valid_email, is_valid_student_code, STUDENT_CODE_FORMAT_MESSAGE};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::field_mapper::{columns, RawStudentRow};

pub const MSG_REQUIRED: &str = "required field is empty";
pub const MSG_INVALID_EMAIL: &str = "invalid email format";
pub const MSG_INVALID_GENDER: &str = "must be M or F";
pub const MSG_INVALID_IDENTIFIER: &str = "invalid identifier format";

pub struct DqValidator {
    /// 居住国回退关闭时 residence_country_id 必填
    require_residence: bool,
}

impl DqValidator {
    pub fn new(require_residence: bool) -> Self {
        Self { require_residence }
    }

    /// 校验一行，返回全部错误（按列顺序）
    pub fn validate(&self, row: &RawStudentRow) -> Vec<ImportRowError> {
        let n = row.row_number;
        let mut errors = Vec::new();
        let require = |column: &str, value: &str, errors: &mut Vec<ImportRowError>| {
            if value.is_empty() {
                errors.push(ImportRowError::new(n, column, "", MSG_REQUIRED));
            }
        };

        require(columns::FIRST_NAMES, &row.first_names, &mut errors);
        require(columns::LAST_NAMES, &row.last_names, &mut errors);

        if !row.email.is_empty() && !is_valid_email(&row.email) {
            errors.push(ImportRowError::new(
                n,
                columns::EMAIL,
                row.email.as_str(),
                MSG_INVALID_EMAIL,
            ));
        }

        require(columns::NATIONALITY_COUNTRY_ID, &row.nationality, &mut errors);
        if self.require_residence {
            require(columns::RESIDENCE_COUNTRY_ID, &row.residence_country, &mut errors);
        }
        require(columns::STATUS, &row.status, &mut errors);
        require(columns::COHORT, &row.cohort, &mut errors);
        require(columns::ENROLLMENT_DATE, &row.enrollment_date, &mut errors);

        if !row.gender.is_empty() {
            let g = DataCleaner::normalize_gender(&row.gender);
            if g != "M" && g != "F" {
                errors.push(ImportRowError::new(
                    n,
                    columns::GENDER,
                    row.gender.as_str(),
                    MSG_INVALID_GENDER,
                ));
            }
        }

        // company_id 没有目录可解析，只接受 UUID
        if !row.company_id.is_empty() && !DataCleaner::is_uuid(&row.company_id) {
            errors.push(ImportRowError::new(
                n,
                columns::COMPANY_ID,
                row.company_id.as_str(),
                MSG_INVALID_IDENTIFIER,
            ));
        }

        if !row.student_code.is_empty() && !is_valid_student_code(&row.student_code) {
            errors.push(ImportRowError::new(
                n,
                columns::STUDENT_CODE,
                row.student_code.as_str(),
                STUDENT_CODE_FORMAT_MESSAGE,
            ));
        }

        errors
    }
}
