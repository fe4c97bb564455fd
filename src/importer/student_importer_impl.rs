// ==========================================
// 学员档案系统 - 学员批量导入器实现
// ==========================================
// 职责: 整合导入流程，从文件字节到学员记录
// 流程: 解析 → 表头 → 批量预检查 → 逐行(校验 → 重复 → 目录解析 → 创建 → 大学关联) → 汇总
// 失败语义:
// - 解析/表头/预检查失败: 整次运行失败
// - 行内问题: 记入 errors，继续下一行
// - 大学关联失败: 仅记录 warn 日志，不进入结果
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{ImportResult, ImportRowError, ROW_LEVEL_FIELD};
use crate::domain::student::CreateStudentRequest;
use crate::importer::catalog_resolver::CatalogResolver;
use crate::importer::conflict_handler::{collect_batch_keys, ConflictHandler};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::dq_validator::{DqValidator, MSG_REQUIRED};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::field_mapper::{columns, FieldMapper, HeaderMap, RawStudentRow};
use crate::importer::file_parser::{FileFormat, UniversalFileParser};
use crate::importer::student_importer_trait::StudentImporter;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::student_repo::StudentRepository;
use crate::service::student_service::StudentService;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 一行解析后的目录引用
#[derive(Debug, Clone, Copy)]
struct ResolvedRefs {
    nationality: Uuid,
    residence: Uuid,
    residence_city: Option<Uuid>,
    profession: Option<Uuid>,
    job_title_category: Option<Uuid>,
}

// ==========================================
// StudentImporterImpl - 学员导入器实现
// ==========================================
pub struct StudentImporterImpl {
    student_service: Arc<dyn StudentService>,
    student_repo: Arc<dyn StudentRepository>,
    catalog_repo: Arc<dyn CatalogRepository>,
    config: Arc<dyn ImportConfigReader>,
    file_parser: UniversalFileParser,
}

impl StudentImporterImpl {
    /// 创建新的 StudentImporter 实例
    ///
    /// # 参数
    /// - student_service: 学员领域服务（逐行创建）
    /// - student_repo: 学员仓储（批量预检查）
    /// - catalog_repo: 目录仓储（名称解析、大学关联）
    /// - config: 导入配置读取器
    pub fn new(
        student_service: Arc<dyn StudentService>,
        student_repo: Arc<dyn StudentRepository>,
        catalog_repo: Arc<dyn CatalogRepository>,
        config: Arc<dyn ImportConfigReader>,
    ) -> Self {
        Self {
            student_service,
            student_repo,
            catalog_repo,
            config,
            file_parser: UniversalFileParser,
        }
    }

    /// 单行处理；Ok 表示学员已创建
    async fn process_row(
        &self,
        row: &RawStudentRow,
        acting_user: Option<Uuid>,
        fallback: bool,
        validator: &DqValidator,
        conflicts: &mut ConflictHandler,
        resolver: &mut CatalogResolver,
    ) -> Result<(), Vec<ImportRowError>> {
        let mut errors = validator.validate(row);
        errors.extend(conflicts.check(row));
        if !errors.is_empty() {
            return Err(errors);
        }

        let refs = Self::resolve_references(row, fallback, resolver)
            .await
            .map_err(|e| vec![e])?;

        let request = Self::build_request(row, &refs);
        let student = self
            .student_service
            .create_student(request, acting_user)
            .await
            .map_err(|e| {
                vec![ImportRowError::new(
                    row.row_number,
                    ROW_LEVEL_FIELD,
                    "",
                    e.to_string(),
                )]
            })?;

        conflicts.mark_seen(row);
        self.link_university(row, student.id, refs.nationality, resolver)
            .await;
        Ok(())
    }

    /// 解析一行的全部目录引用；UUID 原样使用，其余按名称解析
    async fn resolve_references(
        row: &RawStudentRow,
        fallback: bool,
        resolver: &mut CatalogResolver,
    ) -> Result<ResolvedRefs, ImportRowError> {
        let n = row.row_number;
        let fail = |column: &str, raw: &str, message: String| {
            ImportRowError::new(n, column, raw, message)
        };

        let nationality = match Uuid::parse_str(&row.nationality) {
            Ok(id) => id,
            Err(_) => resolver
                .resolve_country(&row.nationality)
                .await
                .map_err(|e| fail(columns::NATIONALITY_COUNTRY_ID, &row.nationality, e.to_string()))?
                .ok_or_else(|| {
                    fail(columns::NATIONALITY_COUNTRY_ID, "", MSG_REQUIRED.to_string())
                })?,
        };

        let residence = if row.residence_country.is_empty() {
            if !fallback {
                return Err(fail(columns::RESIDENCE_COUNTRY_ID, "", MSG_REQUIRED.to_string()));
            }
            nationality
        } else {
            match Uuid::parse_str(&row.residence_country) {
                Ok(id) => id,
                Err(_) => resolver
                    .resolve_country(&row.residence_country)
                    .await
                    .map_err(|e| {
                        fail(columns::RESIDENCE_COUNTRY_ID, &row.residence_country, e.to_string())
                    })?
                    .unwrap_or(nationality),
            }
        };

        let residence_city = match Uuid::parse_str(&row.residence_city) {
            Ok(id) => Some(id),
            Err(_) => resolver
                .resolve_city(&row.residence_city, residence)
                .await
                .map_err(|e| fail(columns::RESIDENCE_CITY_ID, &row.residence_city, e.to_string()))?,
        };

        let profession = match Uuid::parse_str(&row.profession) {
            Ok(id) => Some(id),
            Err(_) => resolver
                .resolve_profession(&row.profession)
                .await
                .map_err(|e| fail(columns::PROFESSION_ID, &row.profession, e.to_string()))?,
        };

        let job_title_category = match Uuid::parse_str(&row.job_title_category) {
            Ok(id) => Some(id),
            Err(_) => resolver
                .resolve_job_title_category(&row.job_title_category)
                .await
                .map_err(|e| {
                    fail(columns::JOB_TITLE_CATEGORY_ID, &row.job_title_category, e.to_string())
                })?,
        };

        Ok(ResolvedRefs {
            nationality,
            residence,
            residence_city,
            profession,
            job_title_category,
        })
    }

    fn build_request(row: &RawStudentRow, refs: &ResolvedRefs) -> CreateStudentRequest {
        let single = |value: &str| -> Vec<String> {
            DataCleaner::non_empty(value).into_iter().collect()
        };

        CreateStudentRequest {
            first_names: row.first_names.clone(),
            last_names: row.last_names.clone(),
            document_id: DataCleaner::non_empty(&row.document_id),
            birth_date: DataCleaner::non_empty(&row.birth_date),
            profile_photo_url: None,
            gender: DataCleaner::non_empty(&row.gender).map(|g| DataCleaner::normalize_gender(&g)),
            nationality_country_id: refs.nationality.to_string(),
            residence_country_id: refs.residence.to_string(),
            residence_city_id: refs.residence_city.map(|id| id.to_string()),
            emails: single(&row.email),
            phones: single(&row.phone),
            company_id: DataCleaner::non_empty(&row.company_id),
            job_title_category_id: refs.job_title_category.map(|id| id.to_string()),
            profession_id: refs.profession.map(|id| id.to_string()),
            student_code: DataCleaner::non_empty(&row.student_code),
            status: row.status.clone(),
            cohort: row.cohort.clone(),
            enrollment_date: row.enrollment_date.clone(),
        }
    }

    /// 大学关联（尽力而为）
    ///
    /// 大学所属国家缺省为国籍；任一步失败只记日志
    async fn link_university(
        &self,
        row: &RawStudentRow,
        student_id: Uuid,
        nationality: Uuid,
        resolver: &mut CatalogResolver,
    ) {
        if row.university.is_empty() {
            return;
        }
        let n = row.row_number;

        let country_id = if row.university_country.is_empty() {
            nationality
        } else if let Ok(id) = Uuid::parse_str(&row.university_country) {
            id
        } else {
            match resolver.resolve_country(&row.university_country).await {
                Ok(id) => id.unwrap_or(nationality),
                Err(e) => {
                    warn!(row = n, value = %row.university_country, error = %e, "大学所属国家解析失败，使用国籍");
                    nationality
                }
            }
        };

        let city_id = match resolver.resolve_city(&row.university_city, country_id).await {
            Ok(id) => id,
            Err(e) => {
                warn!(row = n, value = %row.university_city, error = %e, "大学所在城市解析失败，忽略城市");
                None
            }
        };

        let university_id = match resolver
            .resolve_university(&row.university, city_id, country_id)
            .await
        {
            Ok(Some(id)) => id,
            Ok(None) => return,
            Err(e) => {
                warn!(row = n, value = %row.university, error = %e, "大学解析失败，跳过关联");
                return;
            }
        };

        if let Err(e) = self
            .catalog_repo
            .link_student_university(student_id, university_id)
            .await
        {
            warn!(row = n, student_id = %student_id, error = %e, "学员-大学关联失败");
        }
    }
}

#[async_trait]
impl StudentImporter for StudentImporterImpl {
    #[instrument(skip(self, data, cancel), fields(format = %format, bytes = data.len()))]
    async fn import_cancellable(
        &self,
        data: &[u8],
        format: FileFormat,
        acting_user: Option<Uuid>,
        cancel: Option<&AtomicBool>,
    ) -> ImporterResult<ImportResult> {
        let start_time = Instant::now();
        info!("开始导入学员数据");

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let rows = self.file_parser.parse(data, format).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        if rows.len() < 2 {
            return Err(ImportError::NotEnoughRows);
        }

        let fallback = self
            .config
            .get_residence_country_fallback()
            .await
            .map_err(ImportError::ConfigReadError)?;
        let aliases = self
            .config
            .get_status_aliases()
            .await
            .map_err(ImportError::ConfigReadError)?;

        // === 步骤 2: 表头映射 ===
        debug!(fallback, "步骤 2: 表头映射");
        let (header, data_rows) = rows.split_at(1);
        let headers = HeaderMap::from_header_row(&header[0].cells);
        headers.require_columns(!fallback)?;

        let cleaner = DataCleaner::new(aliases);
        let mapped: Vec<RawStudentRow> = {
            let mapper = FieldMapper::new(&headers, &cleaner);
            data_rows.iter().map(|r| mapper.map_row(r)).collect()
        };
        info!(data_rows = mapped.len(), "文件解析完成");

        // === 步骤 3: 批量预检查 ===
        debug!("步骤 3: 证件号/邮箱批量预检查");
        let (document_ids, emails) = collect_batch_keys(&mapped);
        let existing_documents = self
            .student_repo
            .existing_document_ids(&document_ids)
            .await
            .map_err(|source| ImportError::PreCheckFailed {
                what: "documents",
                source,
            })?;
        let existing_emails = self
            .student_repo
            .existing_emails(&emails)
            .await
            .map_err(|source| ImportError::PreCheckFailed {
                what: "emails",
                source,
            })?;
        debug!(
            existing_documents = existing_documents.len(),
            existing_emails = existing_emails.len(),
            "预检查完成"
        );

        // === 步骤 4: 逐行处理 ===
        let validator = DqValidator::new(!fallback);
        let mut conflicts = ConflictHandler::new(existing_documents, existing_emails);
        let mut resolver = CatalogResolver::new(self.catalog_repo.clone());
        let mut result = ImportResult::default();
        let mut processed = 0usize;

        for row in &mapped {
            if cancel.map_or(false, |flag| flag.load(Ordering::SeqCst)) {
                warn!(processed, remaining = mapped.len() - processed, "导入已取消");
                result.cancelled = true;
                break;
            }
            processed += 1;

            match self
                .process_row(
                    row,
                    acting_user,
                    fallback,
                    &validator,
                    &mut conflicts,
                    &mut resolver,
                )
                .await
            {
                Ok(()) => result.created += 1,
                Err(row_errors) => {
                    debug!(row = row.row_number, errors = row_errors.len(), "行导入失败");
                    result.errors.extend(row_errors);
                }
            }
        }

        // === 步骤 5: 汇总 ===
        result.total_rows = processed;
        info!(
            total_rows = result.total_rows,
            created = result.created,
            failed_rows = result.failed_rows(),
            cancelled = result.cancelled,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "学员导入完成"
        );

        Ok(result)
    }
}
