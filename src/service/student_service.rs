// ==========================================
// 学员档案系统 - 学员领域服务
// ==========================================
// 职责: 单个学员的校验与创建/查询/更新/软删除
// 复用: 导入流水线逐行调用 create_student
// 校验: 日期格式、最低年龄、标识符格式、学号、状态、性别、邮箱
// ==========================================

use crate::config::StudentRulesReader;
use crate::domain::student::{
    is_valid_email, is_valid_student_code, CreateStudentRequest, Gender, Student,
    StudentFilters, StudentStatus, UpdateStudentRequest, STUDENT_CODE_FORMAT_MESSAGE,
};
use crate::repository::error::RepositoryError;
use crate::repository::student_repo::StudentRepository;
use crate::service::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// StudentService Trait
// ==========================================
#[async_trait]
pub trait StudentService: Send + Sync {
    async fn create_student(
        &self,
        req: CreateStudentRequest,
        acting_user: Option<Uuid>,
    ) -> ServiceResult<Student>;

    async fn get_student(&self, id: Uuid) -> ServiceResult<Student>;

    /// 返回 (当前页, 满足条件的总数)
    async fn list_students(&self, filters: StudentFilters) -> ServiceResult<(Vec<Student>, i64)>;

    async fn update_student(
        &self,
        id: Uuid,
        req: UpdateStudentRequest,
        acting_user: Option<Uuid>,
    ) -> ServiceResult<Student>;

    async fn delete_student(&self, id: Uuid, acting_user: Option<Uuid>) -> ServiceResult<()>;
}

// ==========================================
// 字段解析辅助
// ==========================================

fn parse_date(field: &str, raw: &str) -> ServiceResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ServiceError::validation(format!("invalid {} format, expected YYYY-MM-DD", field))
    })
}

fn parse_id(field: &str, raw: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::validation(format!("invalid {}", field)))
}

/// 可选标识符：None 或空串视为未提供
fn parse_opt_id(field: &str, raw: Option<&str>) -> ServiceResult<Option<Uuid>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_id(field, s).map(Some),
        None => Ok(None),
    }
}

fn opt_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn required_text(field: &str, raw: &str) -> ServiceResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn parse_gender(raw: Option<&str>) -> ServiceResult<Option<Gender>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse::<Gender>().map(Some).map_err(ServiceError::Validation),
        None => Ok(None),
    }
}

fn parse_student_code(raw: Option<String>) -> ServiceResult<Option<String>> {
    match opt_text(raw) {
        Some(code) if !is_valid_student_code(&code) => {
            Err(ServiceError::validation(STUDENT_CODE_FORMAT_MESSAGE))
        }
        other => Ok(other),
    }
}

fn clean_emails(raw: Vec<String>) -> ServiceResult<Vec<String>> {
    let emails: Vec<String> = raw
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();
    if let Some(bad) = emails.iter().find(|e| !is_valid_email(e)) {
        return Err(ServiceError::validation(format!("invalid email format: {}", bad)));
    }
    Ok(emails)
}

fn clean_phones(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// 周岁（未到当年生日减一）
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// 唯一约束冲突转为业务冲突
fn map_write_error(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::UniqueConstraintViolation(msg) if msg.contains("document_id") => {
            ServiceError::Conflict("student with this document already exists".to_string())
        }
        RepositoryError::ForeignKeyViolation(_) => {
            ServiceError::validation("referenced catalog entry does not exist")
        }
        other => ServiceError::Repository(other),
    }
}

// ==========================================
// StudentServiceImpl
// ==========================================
pub struct StudentServiceImpl {
    repo: Arc<dyn StudentRepository>,
    rules: Arc<dyn StudentRulesReader>,
}

impl StudentServiceImpl {
    pub fn new(repo: Arc<dyn StudentRepository>, rules: Arc<dyn StudentRulesReader>) -> Self {
        Self { repo, rules }
    }

    async fn check_min_age(&self, birth_date: NaiveDate) -> ServiceResult<()> {
        let min_age = self.rules.get_min_age().await?;
        let today = Utc::now().date_naive();
        if age_on(birth_date, today) < min_age as i32 {
            return Err(ServiceError::validation(format!(
                "student must be at least {} years old",
                min_age
            )));
        }
        Ok(())
    }

    /// limit: <=0 取默认值，超过上限截断；offset 不小于 0
    async fn normalize_page(&self, mut filters: StudentFilters) -> ServiceResult<StudentFilters> {
        let default_limit = self.rules.get_list_default_limit().await?;
        let max_limit = self.rules.get_list_max_limit().await?;
        if filters.limit <= 0 {
            filters.limit = default_limit;
        }
        filters.limit = filters.limit.min(max_limit);
        filters.offset = filters.offset.max(0);
        Ok(filters)
    }
}

#[async_trait]
impl StudentService for StudentServiceImpl {
    async fn create_student(
        &self,
        req: CreateStudentRequest,
        acting_user: Option<Uuid>,
    ) -> ServiceResult<Student> {
        let first_names = required_text("first_names", &req.first_names)?;
        let last_names = required_text("last_names", &req.last_names)?;

        let birth_date = match req.birth_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let date = parse_date("birth_date", raw)?;
                self.check_min_age(date).await?;
                Some(date)
            }
            None => None,
        };
        let enrollment_date = parse_date("enrollment_date", &req.enrollment_date)?;

        let nationality_country_id = parse_id("nationality_country_id", &req.nationality_country_id)?;
        let residence_country_id = parse_id("residence_country_id", &req.residence_country_id)?;
        let residence_city_id = parse_opt_id("residence_city_id", req.residence_city_id.as_deref())?;
        let company_id = parse_opt_id("company_id", req.company_id.as_deref())?;
        let job_title_category_id =
            parse_opt_id("job_title_category_id", req.job_title_category_id.as_deref())?;
        let profession_id = parse_opt_id("profession_id", req.profession_id.as_deref())?;

        let gender = parse_gender(req.gender.as_deref())?;
        let status = req
            .status
            .parse::<StudentStatus>()
            .map_err(ServiceError::Validation)?;
        let student_code = parse_student_code(req.student_code)?;
        let cohort = required_text("cohort", &req.cohort)?;
        let emails = clean_emails(req.emails)?;

        let now = Utc::now();
        let student = Student {
            id: Uuid::new_v4(),
            first_names,
            last_names,
            document_id: opt_text(req.document_id),
            birth_date,
            profile_photo_url: opt_text(req.profile_photo_url),
            gender,
            nationality_country_id,
            residence_country_id,
            residence_city_id,
            emails,
            phones: clean_phones(req.phones),
            company_id,
            job_title_category_id,
            profession_id,
            student_code,
            status,
            cohort,
            enrollment_date,
            graduation_date: None,
            created_at: now,
            created_by: acting_user,
            updated_at: now,
            updated_by: acting_user,
            deleted_at: None,
            deleted_by: None,
        };

        self.repo.create(&student).await.map_err(map_write_error)?;
        debug!(student_id = %student.id, "学员已创建");
        Ok(student)
    }

    async fn get_student(&self, id: Uuid) -> ServiceResult<Student> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    async fn list_students(&self, filters: StudentFilters) -> ServiceResult<(Vec<Student>, i64)> {
        let filters = self.normalize_page(filters).await?;
        let items = self.repo.list(&filters).await?;
        let total = self.repo.count(&filters).await?;
        Ok((items, total))
    }

    async fn update_student(
        &self,
        id: Uuid,
        req: UpdateStudentRequest,
        acting_user: Option<Uuid>,
    ) -> ServiceResult<Student> {
        let mut student = self.get_student(id).await?;

        if let Some(v) = req.first_names {
            student.first_names = required_text("first_names", &v)?;
        }
        if let Some(v) = req.last_names {
            student.last_names = required_text("last_names", &v)?;
        }
        if req.document_id.is_some() {
            student.document_id = opt_text(req.document_id);
        }
        if req.profile_photo_url.is_some() {
            student.profile_photo_url = opt_text(req.profile_photo_url);
        }
        if req.gender.is_some() {
            student.gender = parse_gender(req.gender.as_deref())?;
        }
        if let Some(v) = req.nationality_country_id {
            student.nationality_country_id = parse_id("nationality_country_id", &v)?;
        }
        if let Some(v) = req.residence_country_id {
            student.residence_country_id = parse_id("residence_country_id", &v)?;
        }
        if req.residence_city_id.is_some() {
            student.residence_city_id =
                parse_opt_id("residence_city_id", req.residence_city_id.as_deref())?;
        }
        if let Some(emails) = req.emails {
            let emails = clean_emails(emails)?;
            if emails.is_empty() {
                return Err(ServiceError::validation("at least one email is required"));
            }
            student.emails = emails;
        }
        if let Some(phones) = req.phones {
            student.phones = clean_phones(phones);
        }
        if req.company_id.is_some() {
            student.company_id = parse_opt_id("company_id", req.company_id.as_deref())?;
        }
        if req.job_title_category_id.is_some() {
            student.job_title_category_id =
                parse_opt_id("job_title_category_id", req.job_title_category_id.as_deref())?;
        }
        if req.profession_id.is_some() {
            student.profession_id = parse_opt_id("profession_id", req.profession_id.as_deref())?;
        }
        if req.student_code.is_some() {
            student.student_code = parse_student_code(req.student_code)?;
        }
        if let Some(v) = req.status {
            student.status = v.parse::<StudentStatus>().map_err(ServiceError::Validation)?;
        }
        if let Some(v) = req.graduation_date {
            student.graduation_date = match v.trim() {
                "" => None,
                raw => Some(parse_date("graduation_date", raw)?),
            };
        }

        student.updated_at = Utc::now();
        student.updated_by = acting_user;

        self.repo.update(&student).await.map_err(|e| match e {
            RepositoryError::NotFound { .. } => ServiceError::NotFound(id),
            other => map_write_error(other),
        })?;
        Ok(student)
    }

    async fn delete_student(&self, id: Uuid, acting_user: Option<Uuid>) -> ServiceResult<()> {
        self.repo.delete(id, acting_user).await.map_err(|e| match e {
            RepositoryError::NotFound { .. } => ServiceError::NotFound(id),
            other => ServiceError::Repository(other),
        })?;
        info!(student_id = %id, "学员已删除（软删除）");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_on_birthday_boundary() {
        let birth = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2018, 6, 14).unwrap()), 17);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2018, 6, 15).unwrap()), 18);
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_date("birth_date", "15/06/2000").is_err());
        assert_eq!(
            parse_id("company_id", "acme").unwrap_err().to_string(),
            "invalid company_id"
        );
        assert_eq!(parse_opt_id("company_id", Some("  ")).unwrap(), None);
        assert_eq!(parse_gender(Some("f")).unwrap(), Some(Gender::F));
        assert_eq!(
            parse_student_code(Some("123".into())).unwrap_err().to_string(),
            STUDENT_CODE_FORMAT_MESSAGE
        );
    }
}
