// ==========================================
// 学员档案系统 - 目录数据仓储
// ==========================================
// 职责: 国家/城市/职业/职位类别/大学的按名查找与新建，学员-大学关联
// 红线: Repository 不含业务逻辑（缓存与 find-or-create 编排在 CatalogResolver）
// ==========================================

use crate::domain::catalog::{catalog_name_key, derive_country_code, CatalogKind, NewCatalogEntry};
use crate::repository::db_utils::uuid_from_column;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// CatalogRepository Trait
// ==========================================
// 实现者: CatalogRepositoryImpl（rusqlite）；测试中可用内存实现替换
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// 按名称查找目录项（去空白、大小写与重音不敏感）
    ///
    /// # 参数
    /// - kind: 目录类型
    /// - name: 原始名称
    /// - scope: 城市/大学的所属国家；其他类型忽略
    ///
    /// # 返回
    /// - Ok(Some(id)): 找到
    /// - Ok(None): 不存在
    async fn find_by_name(
        &self,
        kind: CatalogKind,
        name: &str,
        scope: Option<Uuid>,
    ) -> RepositoryResult<Option<Uuid>>;

    /// 新建目录项并返回新 ID
    ///
    /// 同作用域内已存在同名项时返回 UniqueConstraintViolation
    async fn create(&self, kind: CatalogKind, entry: NewCatalogEntry) -> RepositoryResult<Uuid>;

    /// 关联学员与大学（已关联时不报错）
    async fn link_student_university(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> RepositoryResult<()>;
}

// ==========================================
// CatalogRepositoryImpl
// ==========================================
pub struct CatalogRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepositoryImpl {
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

    fn require_scope(kind: CatalogKind, scope: Option<Uuid>) -> RepositoryResult<Uuid> {
        scope.ok_or_else(|| RepositoryError::FieldValueError {
            field: "country_id".to_string(),
            message: format!("{} requires a parent country", kind),
        })
    }
}

#[async_trait]
impl CatalogRepository for CatalogRepositoryImpl {
    async fn find_by_name(
        &self,
        kind: CatalogKind,
        name: &str,
        scope: Option<Uuid>,
    ) -> RepositoryResult<Option<Uuid>> {
        let key = catalog_name_key(name);
        let conn = self.get_conn()?;

        let raw: Option<String> = if kind.is_country_scoped() {
            let country_id = Self::require_scope(kind, scope)?;
            let sql = format!(
                "SELECT id FROM {} WHERE name_key = ?1 AND country_id = ?2 LIMIT 1",
                kind.table()
            );
            conn.query_row(&sql, params![key, country_id.to_string()], |row| row.get(0))
                .optional()?
        } else {
            let sql = format!("SELECT id FROM {} WHERE name_key = ?1 LIMIT 1", kind.table());
            conn.query_row(&sql, params![key], |row| row.get(0))
                .optional()?
        };

        let id = raw.map(|s| uuid_from_column(0, &s)).transpose()?;
        debug!(kind = %kind, name = %name, found = id.is_some(), "目录查找");
        Ok(id)
    }

    async fn create(&self, kind: CatalogKind, entry: NewCatalogEntry) -> RepositoryResult<Uuid> {
        let id = Uuid::new_v4();
        let name = entry.name.trim().to_string();
        let key = catalog_name_key(&name);
        let conn = self.get_conn()?;

        match kind {
            CatalogKind::Country => {
                conn.execute(
                    "INSERT INTO countries (id, code, name, name_key) VALUES (?1, ?2, ?3, ?4)",
                    params![id.to_string(), derive_country_code(&name), name, key],
                )?;
            }
            CatalogKind::City => {
                let country_id = Self::require_scope(kind, entry.country_id)?;
                conn.execute(
                    "INSERT INTO cities (id, country_id, name, name_key) VALUES (?1, ?2, ?3, ?4)",
                    params![id.to_string(), country_id.to_string(), name, key],
                )?;
            }
            CatalogKind::Profession | CatalogKind::JobTitleCategory => {
                let sql = format!(
                    "INSERT INTO {} (id, name, name_key) VALUES (?1, ?2, ?3)",
                    kind.table()
                );
                conn.execute(&sql, params![id.to_string(), name, key])?;
            }
            CatalogKind::University => {
                let country_id = Self::require_scope(kind, entry.country_id)?;
                conn.execute(
                    r#"
                    INSERT INTO universities (id, country_id, city_id, name, name_key)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        id.to_string(),
                        country_id.to_string(),
                        entry.city_id.map(|c| c.to_string()),
                        name,
                        key
                    ],
                )?;
            }
        }

        debug!(kind = %kind, id = %id, name = %name, "目录项已创建");
        Ok(id)
    }

    async fn link_student_university(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO student_universities (student_id, university_id)
            VALUES (?1, ?2)
            ON CONFLICT (student_id, university_id) DO NOTHING
            "#,
            params![student_id.to_string(), university_id.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> CatalogRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        CatalogRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_find_is_case_and_accent_insensitive() {
        let repo = setup_repo();
        let id = repo
            .create(CatalogKind::Country, NewCatalogEntry::global("Perú"))
            .await
            .unwrap();

        for probe in ["Perú", "peru", " PERU ", "PERÚ"] {
            let found = repo
                .find_by_name(CatalogKind::Country, probe, None)
                .await
                .unwrap();
            assert_eq!(found, Some(id), "probe {:?}", probe);
        }
    }

    #[tokio::test]
    async fn test_country_code_is_derived() {
        let repo = setup_repo();
        let id = repo
            .create(CatalogKind::Country, NewCatalogEntry::global(" Colombia "))
            .await
            .unwrap();

        let conn = repo.get_conn().unwrap();
        let (code, name): (String, String) = conn
            .query_row(
                "SELECT code, name FROM countries WHERE id = ?1",
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(code, "COL");
        assert_eq!(name, "Colombia");
    }

    #[tokio::test]
    async fn test_duplicate_name_is_unique_violation() {
        let repo = setup_repo();
        repo.create(CatalogKind::Profession, NewCatalogEntry::global("Ingeniería"))
            .await
            .unwrap();
        let err = repo
            .create(CatalogKind::Profession, NewCatalogEntry::global("ingenieria"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_city_scoped_by_country() {
        let repo = setup_repo();
        let peru = repo
            .create(CatalogKind::Country, NewCatalogEntry::global("Peru"))
            .await
            .unwrap();
        let chile = repo
            .create(CatalogKind::Country, NewCatalogEntry::global("Chile"))
            .await
            .unwrap();

        let lima_pe = repo
            .create(CatalogKind::City, NewCatalogEntry::scoped("Lima", peru))
            .await
            .unwrap();
        // 不同国家下允许同名城市
        let lima_cl = repo
            .create(CatalogKind::City, NewCatalogEntry::scoped("Lima", chile))
            .await
            .unwrap();
        assert_ne!(lima_pe, lima_cl);

        assert_eq!(
            repo.find_by_name(CatalogKind::City, "LIMA", Some(chile))
                .await
                .unwrap(),
            Some(lima_cl)
        );
        assert!(repo
            .find_by_name(CatalogKind::City, "Lima", None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_university_with_city() {
        let repo = setup_repo();
        let peru = repo
            .create(CatalogKind::Country, NewCatalogEntry::global("Peru"))
            .await
            .unwrap();
        let lima = repo
            .create(CatalogKind::City, NewCatalogEntry::scoped("Lima", peru))
            .await
            .unwrap();

        let mut entry = NewCatalogEntry::scoped("Universidad de Lima", peru);
        entry.city_id = Some(lima);
        let uni = repo.create(CatalogKind::University, entry).await.unwrap();

        let found = repo
            .find_by_name(CatalogKind::University, "universidad de lima", Some(peru))
            .await
            .unwrap();
        assert_eq!(found, Some(uni));
    }
}
