// ==========================================
// 计数目录仓储 - 用于集成测试
// ==========================================
// 包装真实的 CatalogRepositoryImpl，记录每类目录的查找/新建次数
// ==========================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use student_registry::domain::{CatalogKind, NewCatalogEntry};
use student_registry::repository::{CatalogRepository, CatalogRepositoryImpl, RepositoryResult};
use uuid::Uuid;

pub struct CountingCatalogRepository {
    inner: CatalogRepositoryImpl,
    finds: Mutex<HashMap<CatalogKind, usize>>,
    creates: Mutex<HashMap<CatalogKind, usize>>,
}

impl CountingCatalogRepository {
    pub fn new(inner: CatalogRepositoryImpl) -> Self {
        Self {
            inner,
            finds: Mutex::new(HashMap::new()),
            creates: Mutex::new(HashMap::new()),
        }
    }

    pub fn finds(&self, kind: CatalogKind) -> usize {
        self.finds.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    pub fn creates(&self, kind: CatalogKind) -> usize {
        self.creates.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    /// 所有目录的查找 + 新建次数
    pub fn total_calls(&self) -> usize {
        let finds: usize = self.finds.lock().unwrap().values().sum();
        let creates: usize = self.creates.lock().unwrap().values().sum();
        finds + creates
    }
}

#[async_trait]
impl CatalogRepository for CountingCatalogRepository {
    async fn find_by_name(
        &self,
        kind: CatalogKind,
        name: &str,
        scope: Option<Uuid>,
    ) -> RepositoryResult<Option<Uuid>> {
        *self.finds.lock().unwrap().entry(kind).or_insert(0) += 1;
        self.inner.find_by_name(kind, name, scope).await
    }

    async fn create(&self, kind: CatalogKind, entry: NewCatalogEntry) -> RepositoryResult<Uuid> {
        *self.creates.lock().unwrap().entry(kind).or_insert(0) += 1;
        self.inner.create(kind, entry).await
    }

    async fn link_student_university(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> RepositoryResult<()> {
        self.inner
            .link_student_university(student_id, university_id)
            .await
    }
}
