// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use std::collections::HashMap;
use student_registry::config::{default_status_aliases, ImportConfigReader, StudentRulesReader};
use student_registry::repository::RepositoryResult;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub residence_country_fallback: bool,
    pub status_aliases: HashMap<String, String>,
    pub min_age: u32,
    pub list_default_limit: i64,
    pub list_max_limit: i64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            residence_country_fallback: true,
            status_aliases: default_status_aliases(),
            min_age: 18,
            list_default_limit: 20,
            list_max_limit: 100,
        }
    }
}

impl MockConfig {
    /// 关闭居住国回退（residence_country_id 列必填）
    pub fn without_fallback() -> Self {
        Self {
            residence_country_fallback: false,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_residence_country_fallback(&self) -> RepositoryResult<bool> {
        Ok(self.residence_country_fallback)
    }

    async fn get_status_aliases(&self) -> RepositoryResult<HashMap<String, String>> {
        Ok(self.status_aliases.clone())
    }
}

#[async_trait]
impl StudentRulesReader for MockConfig {
    async fn get_min_age(&self) -> RepositoryResult<u32> {
        Ok(self.min_age)
    }

    async fn get_list_default_limit(&self) -> RepositoryResult<i64> {
        Ok(self.list_default_limit)
    }

    async fn get_list_max_limit(&self) -> RepositoryResult<i64> {
        Ok(self.list_max_limit)
    }
}
