// ==========================================
// 学员档案系统 - 目录名称解析器
// ==========================================
// 职责: 名称 → 目录 ID（先查缓存，再查库，最后新建）
// 生命周期: 每次导入运行创建一个，运行结束即丢弃
// 缓存: 五类目录各自独立；键为小写去空白名称（城市/大学附加所属国家）
// 约束: 失败结果不缓存；非空名称成功时必定返回 ID
// ==========================================

use crate::domain::catalog::{CatalogKind, NewCatalogEntry};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::RepositoryResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct CatalogResolver {
    repo: Arc<dyn CatalogRepository>,
    countries: HashMap<String, Uuid>,
    cities: HashMap<String, Uuid>,
    professions: HashMap<String, Uuid>,
    job_title_categories: HashMap<String, Uuid>,
    universities: HashMap<String, Uuid>,
}

impl CatalogResolver {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self {
            repo,
            countries: HashMap::new(),
            cities: HashMap::new(),
            professions: HashMap::new(),
            job_title_categories: HashMap::new(),
            universities: HashMap::new(),
        }
    }

    pub async fn resolve_country(&mut self, name: &str) -> RepositoryResult<Option<Uuid>> {
        self.resolve(CatalogKind::Country, name, None, None).await
    }

    pub async fn resolve_city(
        &mut self,
        name: &str,
        country_id: Uuid,
    ) -> RepositoryResult<Option<Uuid>> {
        self.resolve(CatalogKind::City, name, Some(country_id), None)
            .await
    }

    pub async fn resolve_profession(&mut self, name: &str) -> RepositoryResult<Option<Uuid>> {
        self.resolve(CatalogKind::Profession, name, None, None).await
    }

    pub async fn resolve_job_title_category(
        &mut self,
        name: &str,
    ) -> RepositoryResult<Option<Uuid>> {
        self.resolve(CatalogKind::JobTitleCategory, name, None, None)
            .await
    }

    /// city_id 仅在新建大学时写入，不参与查找与缓存键
    pub async fn resolve_university(
        &mut self,
        name: &str,
        city_id: Option<Uuid>,
        country_id: Uuid,
    ) -> RepositoryResult<Option<Uuid>> {
        self.resolve(CatalogKind::University, name, Some(country_id), city_id)
            .await
    }

    /// 当前缓存的条目数（所有目录合计）
    pub fn cached_entries(&self) -> usize {
        self.countries.len()
            + self.cities.len()
            + self.professions.len()
            + self.job_title_categories.len()
            + self.universities.len()
    }

    fn cache(&self, kind: CatalogKind) -> &HashMap<String, Uuid> {
        match kind {
            CatalogKind::Country => &self.countries,
            CatalogKind::City => &self.cities,
            CatalogKind::Profession => &self.professions,
            CatalogKind::JobTitleCategory => &self.job_title_categories,
            CatalogKind::University => &self.universities,
        }
    }

    fn cache_mut(&mut self, kind: CatalogKind) -> &mut HashMap<String, Uuid> {
        match kind {
            CatalogKind::Country => &mut self.countries,
            CatalogKind::City => &mut self.cities,
            CatalogKind::Profession => &mut self.professions,
            CatalogKind::JobTitleCategory => &mut self.job_title_categories,
            CatalogKind::University => &mut self.universities,
        }
    }

    fn cache_key(name: &str, scope: Option<Uuid>) -> String {
        let normalized = name.trim().to_lowercase();
        match scope {
            Some(country_id) => format!("{}|{}", country_id, normalized),
            None => normalized,
        }
    }

    async fn resolve(
        &mut self,
        kind: CatalogKind,
        name: &str,
        scope: Option<Uuid>,
        city_id: Option<Uuid>,
    ) -> RepositoryResult<Option<Uuid>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let key = Self::cache_key(name, scope);
        if let Some(id) = self.cache(kind).get(&key) {
            return Ok(Some(*id));
        }

        let id = match self.repo.find_by_name(kind, name, scope).await? {
            Some(id) => id,
            None => self.create_or_refetch(kind, name, scope, city_id).await?,
        };

        self.cache_mut(kind).insert(key, id);
        Ok(Some(id))
    }

    /// 新建；若与并发写入撞上唯一约束，则重新查找并采用已存在的 ID
    async fn create_or_refetch(
        &self,
        kind: CatalogKind,
        name: &str,
        scope: Option<Uuid>,
        city_id: Option<Uuid>,
    ) -> RepositoryResult<Uuid> {
        let entry = NewCatalogEntry {
            name: name.to_string(),
            country_id: scope,
            city_id,
        };

        match self.repo.create(kind, entry).await {
            Ok(id) => {
                debug!(kind = %kind, name = %name, id = %id, "目录项新建");
                Ok(id)
            }
            Err(err) if err.is_unique_violation() => {
                match self.repo.find_by_name(kind, name, scope).await? {
                    Some(id) => {
                        debug!(kind = %kind, name = %name, id = %id, "唯一约束冲突，采用已存在的目录项");
                        Ok(id)
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}
