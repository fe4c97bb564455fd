// ==========================================
// 学员档案系统 - 学员领域模型
// ==========================================
// 职责: 学员实体、状态/性别枚举、创建/更新请求 DTO、列表过滤条件
// 说明: 以 first_names/last_names/nationality_country_id 结构为准，
//       旧版 full_name/country_origin_id 结构已废弃
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

static RE_EMAIL: OnceLock<Regex> = OnceLock::new();
static RE_STUDENT_CODE: OnceLock<Regex> = OnceLock::new();

/// 学号格式说明（错误消息使用）
pub const STUDENT_CODE_FORMAT_MESSAGE: &str =
    "invalid student_code format, expected YYYYS#### (e.g. 202620190)";

/// 邮箱语法校验（local@domain，domain 由点分标签组成）
pub fn is_valid_email(email: &str) -> bool {
    RE_EMAIL
        .get_or_init(|| {
            Regex::new(
                r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$",
            )
            .expect("email pattern is valid")
        })
        .is_match(email)
}

/// 学号: 4 位年份 + 学期位(1|2) + 4 位序号
pub fn is_valid_student_code(code: &str) -> bool {
    RE_STUDENT_CODE
        .get_or_init(|| Regex::new(r"^[0-9]{4}[12][0-9]{4}$").expect("student code pattern is valid"))
        .is_match(code)
}

// ==========================================
// StudentStatus - 学籍状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Graduated,
    Withdrawn,
    Suspended,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Graduated => "graduated",
            StudentStatus::Withdrawn => "withdrawn",
            StudentStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(StudentStatus::Active),
            "graduated" => Ok(StudentStatus::Graduated),
            "withdrawn" => Ok(StudentStatus::Withdrawn),
            "suspended" => Ok(StudentStatus::Suspended),
            other => Err(format!(
                "invalid status '{}', expected one of active, graduated, withdrawn, suspended",
                other
            )),
        }
    }
}

// ==========================================
// Gender - 性别（M/F）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M" => Ok(Gender::M),
            "F" => Ok(Gender::F),
            _ => Err("must be M or F".to_string()),
        }
    }
}

// ==========================================
// Student - 学员实体
// ==========================================
// 对齐: students 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub first_names: String,
    pub last_names: String,
    pub document_id: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub profile_photo_url: Option<String>,
    pub gender: Option<Gender>,

    // ===== 国籍/居住地 =====
    pub nationality_country_id: Uuid,
    pub residence_country_id: Uuid,
    pub residence_city_id: Option<Uuid>,

    // ===== 联系方式 =====
    pub emails: Vec<String>,
    pub phones: Vec<String>,

    // ===== 职业信息 =====
    pub company_id: Option<Uuid>,
    pub job_title_category_id: Option<Uuid>,
    pub profession_id: Option<Uuid>,

    // ===== 学籍 =====
    pub student_code: Option<String>,
    pub status: StudentStatus,
    pub cohort: String,
    pub enrollment_date: NaiveDate,
    pub graduation_date: Option<NaiveDate>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
}

// ==========================================
// CreateStudentRequest - 创建请求
// ==========================================
// 标识类字段与日期均为原始字符串，由 StudentService 负责解析校验
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateStudentRequest {
    pub first_names: String,
    pub last_names: String,
    pub document_id: Option<String>,
    pub birth_date: Option<String>,
    pub profile_photo_url: Option<String>,
    pub gender: Option<String>,
    pub nationality_country_id: String,
    pub residence_country_id: String,
    pub residence_city_id: Option<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub company_id: Option<String>,
    pub job_title_category_id: Option<String>,
    pub profession_id: Option<String>,
    pub student_code: Option<String>,
    pub status: String,
    pub cohort: String,
    pub enrollment_date: String,
}

// ==========================================
// UpdateStudentRequest - 部分更新请求（None = 不修改）
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateStudentRequest {
    pub first_names: Option<String>,
    pub last_names: Option<String>,
    pub document_id: Option<String>,
    pub profile_photo_url: Option<String>,
    pub gender: Option<String>,
    pub nationality_country_id: Option<String>,
    pub residence_country_id: Option<String>,
    pub residence_city_id: Option<String>,
    pub emails: Option<Vec<String>>,
    pub phones: Option<Vec<String>>,
    pub company_id: Option<String>,
    pub job_title_category_id: Option<String>,
    pub profession_id: Option<String>,
    pub student_code: Option<String>,
    pub status: Option<String>,
    pub graduation_date: Option<String>,
}

// ==========================================
// StudentFilters - 列表查询条件
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StudentFilters {
    pub status: Option<StudentStatus>,
    pub cohort: Option<String>,
    pub residence_country_id: Option<Uuid>,
    /// 按 first_names / last_names 子串匹配
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!("Active".parse::<StudentStatus>(), Ok(StudentStatus::Active));
        assert_eq!(" graduated ".parse::<StudentStatus>(), Ok(StudentStatus::Graduated));
        assert!("activo".parse::<StudentStatus>().is_err());
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!("m".parse::<Gender>(), Ok(Gender::M));
        assert_eq!("F".parse::<Gender>(), Ok(Gender::F));
        assert_eq!("X".parse::<Gender>(), Err("must be M or F".to_string()));
    }

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("ana@x.com"));
        assert!(is_valid_email("ana.gomez+uni@mail.example.org"));
        assert!(!is_valid_email("ana@"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("ana gomez@x.com"));
    }

    #[test]
    fn test_student_code_pattern() {
        assert!(is_valid_student_code("202620190"));
        assert!(is_valid_student_code("202510001"));
        assert!(!is_valid_student_code("202630190"));
        assert!(!is_valid_student_code("20262019"));
        assert!(!is_valid_student_code("2026A0190"));
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&StudentStatus::Withdrawn).unwrap();
        assert_eq!(json, "\"withdrawn\"");
    }
}
