// ==========================================
// 学员档案系统 - 数据清洗器实现
// ==========================================
// 职责: 状态别名映射 / 性别大小写标准化 / 空值标准化 / UUID 识别
// ==========================================

use std::collections::HashMap;
use uuid::Uuid;

pub struct DataCleaner {
    /// 小写别名 → 规范状态
    status_aliases: HashMap<String, String>,
}

impl DataCleaner {
    pub fn new(status_aliases: HashMap<String, String>) -> Self {
        Self { status_aliases }
    }

    /// 状态别名映射；未命中时原样返回（去空白）
    pub fn normalize_status(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        self.status_aliases
            .get(&trimmed.to_lowercase())
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// 空串 → None
    pub fn non_empty(value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// 性别转大写（校验由 DqValidator 负责）
    pub fn normalize_gender(value: &str) -> String {
        value.trim().to_uppercase()
    }

    /// 是否为合法 UUID 文本
    pub fn is_uuid(value: &str) -> bool {
        Uuid::parse_str(value.trim()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_status_aliases;

    #[test]
    fn test_normalize_status() {
        let cleaner = DataCleaner::new(default_status_aliases());
        assert_eq!(cleaner.normalize_status("ACTIVO"), "active");
        assert_eq!(cleaner.normalize_status(" suspendido "), "suspended");
        assert_eq!(cleaner.normalize_status("Graduated"), "Graduated");
        assert_eq!(cleaner.normalize_status("  "), "");
    }

    #[test]
    fn test_is_uuid() {
        assert!(DataCleaner::is_uuid(&Uuid::new_v4().to_string()));
        assert!(!DataCleaner::is_uuid("Colombia"));
        assert!(!DataCleaner::is_uuid(""));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(DataCleaner::non_empty("  "), None);
        assert_eq!(DataCleaner::non_empty(" x "), Some("x".to_string()));
    }
}
