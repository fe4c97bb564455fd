// ==========================================
// 集成测试辅助模块
// ==========================================

#![allow(dead_code)]

pub mod counting_catalog;
pub mod mock_config;

use std::sync::Arc;
use student_registry::importer::StudentImporterImpl;
use student_registry::repository::{CatalogRepositoryImpl, StudentRepositoryImpl};
use student_registry::service::StudentServiceImpl;

use counting_catalog::CountingCatalogRepository;
use mock_config::MockConfig;

/// 测试用导入器及其可观测的依赖
pub struct ImporterFixture {
    pub importer: StudentImporterImpl,
    pub catalog: Arc<CountingCatalogRepository>,
}

/// 基于临时数据库装配导入器（配置使用 MockConfig）
pub fn build_importer(db_path: &str, config: MockConfig) -> ImporterFixture {
    let config = Arc::new(config);
    let student_repo = Arc::new(StudentRepositoryImpl::new(db_path).unwrap());
    let catalog = Arc::new(CountingCatalogRepository::new(
        CatalogRepositoryImpl::new(db_path).unwrap(),
    ));
    let service = Arc::new(StudentServiceImpl::new(student_repo.clone(), config.clone()));
    let importer = StudentImporterImpl::new(service, student_repo, catalog.clone(), config);

    ImporterFixture { importer, catalog }
}
