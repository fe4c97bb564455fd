// ==========================================
// 学员档案系统 - 配置读取 Trait
// ==========================================
// 职责: 定义导入模块与学员服务所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashMap;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入流水线所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 居住国缺失时是否回退为国籍
    ///
    /// # 默认值
    /// - true
    ///
    /// # 影响
    /// - false 时 residence_country_id 成为必填列与必填字段
    async fn get_residence_country_fallback(&self) -> RepositoryResult<bool>;

    /// 状态别名表（小写别名 → 规范状态）
    ///
    /// # 默认值
    /// - {"activo": "active", "graduado": "graduated",
    ///    "retirado": "withdrawn", "suspendido": "suspended"}
    async fn get_status_aliases(&self) -> RepositoryResult<HashMap<String, String>>;
}

// ==========================================
// StudentRulesReader Trait
// ==========================================
// 用途: 学员服务的校验与分页参数
#[async_trait]
pub trait StudentRulesReader: Send + Sync {
    /// 最低年龄（默认 18）
    async fn get_min_age(&self) -> RepositoryResult<u32>;

    /// 列表默认分页大小（默认 20）
    async fn get_list_default_limit(&self) -> RepositoryResult<i64>;

    /// 列表最大分页大小（默认 100）
    async fn get_list_max_limit(&self) -> RepositoryResult<i64>;
}

/// 默认状态别名表
pub fn default_status_aliases() -> HashMap<String, String> {
    [
        ("activo", "active"),
        ("graduado", "graduated"),
        ("retirado", "withdrawn"),
        ("suspendido", "suspended"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
