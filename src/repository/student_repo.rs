// ==========================================
// 学员档案系统 - 学员数据仓储
// ==========================================
// 职责: students 表 CRUD（软删除）与批量存在性检查
// 红线: Repository 不含业务逻辑，只做数据 CRUD
// 约束: 已软删除的学员对查询、计数、存在性检查均不可见
// ==========================================

use crate::domain::student::{Gender, Student, StudentFilters, StudentStatus};
use crate::repository::db_utils::{
    build_in_clause, date_from_column, opt_uuid_from_column, timestamp_from_column,
    uuid_from_column, IN_CLAUSE_CHUNK_SIZE,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// StudentRepository Trait
// ==========================================
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn create(&self, student: &Student) -> RepositoryResult<()>;

    /// 按 ID 查询（已删除视为不存在）
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Student>>;

    /// 按过滤条件分页查询，按入学日期倒序
    async fn list(&self, filters: &StudentFilters) -> RepositoryResult<Vec<Student>>;

    /// 与 list 相同的过滤条件计数（忽略分页）
    async fn count(&self, filters: &StudentFilters) -> RepositoryResult<i64>;

    /// 全量覆盖可变字段；学员不存在时返回 NotFound
    async fn update(&self, student: &Student) -> RepositoryResult<()>;

    /// 软删除；学员不存在或已删除时返回 NotFound
    async fn delete(&self, id: Uuid, deleted_by: Option<Uuid>) -> RepositoryResult<()>;

    /// 返回输入中已被在册学员使用的证件号
    async fn existing_document_ids(&self, document_ids: &[String])
        -> RepositoryResult<HashSet<String>>;

    /// 返回输入中已出现在在册学员邮箱列表里的邮箱
    async fn existing_emails(&self, emails: &[String]) -> RepositoryResult<HashSet<String>>;
}

const SELECT_COLUMNS: &str = r#"
    id, first_names, last_names, document_id, birth_date, profile_photo_url,
    gender, nationality_country_id, residence_country_id, residence_city_id,
    emails, phones, company_id, job_title_category_id, profession_id,
    student_code, status, cohort, enrollment_date, graduation_date,
    created_at, created_by, updated_at, updated_by, deleted_at, deleted_by
"#;

// ==========================================
// StudentRepositoryImpl
// ==========================================
pub struct StudentRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepositoryImpl {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 构建过滤条件 WHERE 片段与参数
    fn build_filter(filters: &StudentFilters) -> (String, Vec<Value>) {
        let mut sql = String::from("deleted_at IS NULL");
        let mut args: Vec<Value> = Vec::new();

        if let Some(status) = filters.status {
            sql.push_str(" AND status = ?");
            args.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(cohort) = &filters.cohort {
            sql.push_str(" AND cohort = ?");
            args.push(Value::Text(cohort.clone()));
        }
        if let Some(country_id) = filters.residence_country_id {
            sql.push_str(" AND residence_country_id = ?");
            args.push(Value::Text(country_id.to_string()));
        }
        if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // SQLite LIKE 对 ASCII 大小写不敏感
            sql.push_str(" AND (first_names LIKE ? OR last_names LIKE ?)");
            let pattern = format!("%{}%", search);
            args.push(Value::Text(pattern.clone()));
            args.push(Value::Text(pattern));
        }

        (sql, args)
    }

    fn map_student(row: &Row) -> rusqlite::Result<Student> {
        let gender = row
            .get::<_, Option<String>>(6)?
            .map(|g| {
                g.parse::<Gender>()
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into()))
            })
            .transpose()?;
        let status = row
            .get::<_, String>(16)?
            .parse::<StudentStatus>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(16, Type::Text, e.into()))?;
        let emails: Vec<String> = serde_json::from_str(&row.get::<_, String>(10)?)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;
        let phones: Vec<String> = serde_json::from_str(&row.get::<_, String>(11)?)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e)))?;

        Ok(Student {
            id: uuid_from_column(0, &row.get::<_, String>(0)?)?,
            first_names: row.get(1)?,
            last_names: row.get(2)?,
            document_id: row.get(3)?,
            birth_date: row
                .get::<_, Option<String>>(4)?
                .map(|s| date_from_column(4, &s))
                .transpose()?,
            profile_photo_url: row.get(5)?,
            gender,
            nationality_country_id: uuid_from_column(7, &row.get::<_, String>(7)?)?,
            residence_country_id: uuid_from_column(8, &row.get::<_, String>(8)?)?,
            residence_city_id: opt_uuid_from_column(9, row.get(9)?)?,
            emails,
            phones,
            company_id: opt_uuid_from_column(12, row.get(12)?)?,
            job_title_category_id: opt_uuid_from_column(13, row.get(13)?)?,
            profession_id: opt_uuid_from_column(14, row.get(14)?)?,
            student_code: row.get(15)?,
            status,
            cohort: row.get(17)?,
            enrollment_date: date_from_column(18, &row.get::<_, String>(18)?)?,
            graduation_date: row
                .get::<_, Option<String>>(19)?
                .map(|s| date_from_column(19, &s))
                .transpose()?,
            created_at: timestamp_from_column(20, &row.get::<_, String>(20)?)?,
            created_by: opt_uuid_from_column(21, row.get(21)?)?,
            updated_at: timestamp_from_column(22, &row.get::<_, String>(22)?)?,
            updated_by: opt_uuid_from_column(23, row.get(23)?)?,
            deleted_at: row
                .get::<_, Option<String>>(24)?
                .map(|s| timestamp_from_column(24, &s))
                .transpose()?,
            deleted_by: opt_uuid_from_column(25, row.get(25)?)?,
        })
    }

    /// 分块执行 IN 查询，收集命中的值
    fn collect_existing(
        conn: &Connection,
        values: &[String],
        build_sql: impl Fn(&[String]) -> String,
    ) -> RepositoryResult<HashSet<String>> {
        let mut found = HashSet::new();
        for chunk in values.chunks(IN_CLAUSE_CHUNK_SIZE) {
            let sql = build_sql(chunk);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                row.get::<_, String>(0)
            })?;
            for value in rows {
                found.insert(value?);
            }
        }
        Ok(found)
    }
}

/// 去空白、去空、去重
fn distinct_non_empty(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl StudentRepository for StudentRepositoryImpl {
    async fn create(&self, student: &Student) -> RepositoryResult<()> {
        let emails = serde_json::to_string(&student.emails)?;
        let phones = serde_json::to_string(&student.phones)?;
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO students (
                id, first_names, last_names, document_id, birth_date, profile_photo_url,
                gender, nationality_country_id, residence_country_id, residence_city_id,
                emails, phones, company_id, job_title_category_id, profession_id,
                student_code, status, cohort, enrollment_date, graduation_date,
                created_at, created_by, updated_at, updated_by
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
            )
            "#,
            params![
                student.id.to_string(),
                student.first_names,
                student.last_names,
                student.document_id,
                student.birth_date.map(|d| d.to_string()),
                student.profile_photo_url,
                student.gender.map(|g| g.as_str()),
                student.nationality_country_id.to_string(),
                student.residence_country_id.to_string(),
                student.residence_city_id.map(|id| id.to_string()),
                emails,
                phones,
                student.company_id.map(|id| id.to_string()),
                student.job_title_category_id.map(|id| id.to_string()),
                student.profession_id.map(|id| id.to_string()),
                student.student_code,
                student.status.as_str(),
                student.cohort,
                student.enrollment_date.to_string(),
                student.graduation_date.map(|d| d.to_string()),
                student.created_at.to_rfc3339(),
                student.created_by.map(|id| id.to_string()),
                student.updated_at.to_rfc3339(),
                student.updated_by.map(|id| id.to_string()),
            ],
        )?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM students WHERE id = ?1 AND deleted_at IS NULL",
            SELECT_COLUMNS
        );
        let student = conn
            .query_row(&sql, params![id.to_string()], Self::map_student)
            .optional()?;
        Ok(student)
    }

    async fn list(&self, filters: &StudentFilters) -> RepositoryResult<Vec<Student>> {
        let (where_sql, mut args) = Self::build_filter(filters);
        let mut sql = format!(
            "SELECT {} FROM students WHERE {} ORDER BY enrollment_date DESC, created_at DESC",
            SELECT_COLUMNS, where_sql
        );
        if filters.limit > 0 {
            sql.push_str(" LIMIT ? OFFSET ?");
            args.push(Value::Integer(filters.limit));
            args.push(Value::Integer(filters.offset.max(0)));
        }

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let students = stmt
            .query_map(params_from_iter(args.iter()), Self::map_student)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    async fn count(&self, filters: &StudentFilters) -> RepositoryResult<i64> {
        let (where_sql, args) = Self::build_filter(filters);
        let sql = format!("SELECT COUNT(*) FROM students WHERE {}", where_sql);

        let conn = self.get_conn()?;
        let total: i64 = conn.query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))?;
        Ok(total)
    }

    async fn update(&self, student: &Student) -> RepositoryResult<()> {
        let emails = serde_json::to_string(&student.emails)?;
        let phones = serde_json::to_string(&student.phones)?;
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE students SET
                first_names = ?2,
                last_names = ?3,
                document_id = ?4,
                profile_photo_url = ?5,
                gender = ?6,
                nationality_country_id = ?7,
                residence_country_id = ?8,
                residence_city_id = ?9,
                emails = ?10,
                phones = ?11,
                company_id = ?12,
                job_title_category_id = ?13,
                profession_id = ?14,
                student_code = ?15,
                status = ?16,
                graduation_date = ?17,
                updated_at = ?18,
                updated_by = ?19
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
            params![
                student.id.to_string(),
                student.first_names,
                student.last_names,
                student.document_id,
                student.profile_photo_url,
                student.gender.map(|g| g.as_str()),
                student.nationality_country_id.to_string(),
                student.residence_country_id.to_string(),
                student.residence_city_id.map(|id| id.to_string()),
                emails,
                phones,
                student.company_id.map(|id| id.to_string()),
                student.job_title_category_id.map(|id| id.to_string()),
                student.profession_id.map(|id| id.to_string()),
                student.student_code,
                student.status.as_str(),
                student.graduation_date.map(|d| d.to_string()),
                student.updated_at.to_rfc3339(),
                student.updated_by.map(|id| id.to_string()),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Student".to_string(),
                id: student.id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid, deleted_by: Option<Uuid>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE students
            SET deleted_at = ?2, deleted_by = ?3
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
            params![
                id.to_string(),
                Utc::now().to_rfc3339(),
                deleted_by.map(|u| u.to_string())
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Student".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn existing_document_ids(
        &self,
        document_ids: &[String],
    ) -> RepositoryResult<HashSet<String>> {
        let values = distinct_non_empty(document_ids);
        if values.is_empty() {
            return Ok(HashSet::new());
        }

        let conn = self.get_conn()?;
        Self::collect_existing(&conn, &values, |chunk| {
            format!(
                "SELECT DISTINCT document_id FROM students WHERE deleted_at IS NULL AND {}",
                build_in_clause("document_id", chunk)
            )
        })
    }

    async fn existing_emails(&self, emails: &[String]) -> RepositoryResult<HashSet<String>> {
        let values = distinct_non_empty(emails);
        if values.is_empty() {
            return Ok(HashSet::new());
        }

        let conn = self.get_conn()?;
        Self::collect_existing(&conn, &values, |chunk| {
            format!(
                r#"
                SELECT DISTINCT je.value
                FROM students s, json_each(s.emails) je
                WHERE s.deleted_at IS NULL AND {}
                "#,
                build_in_clause("je.value", chunk)
            )
        })
    }
}
