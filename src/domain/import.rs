// ==========================================
// 学员档案系统 - 导入结果模型
// ==========================================
// 用途: 一次导入运行的汇总结果与行级错误
// 生命周期: 导入开始时创建，返回后不再修改
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 行级错误的字段名：学员创建被领域服务拒绝时使用
pub const ROW_LEVEL_FIELD: &str = "_row";

// ==========================================
// ImportRowError - 行级错误
// ==========================================
// row: 1 起始，表头计为第 1 行（首个数据行为第 2 行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row: usize,
    pub field: String,
    pub value: String,
    pub message: String,
}

impl ImportRowError {
    pub fn new(
        row: usize,
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

// ==========================================
// ImportResult - 导入汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub total_rows: usize,
    pub created: usize,
    pub errors: Vec<ImportRowError>,
    /// 运行被取消时为 true（已处理的行结果有效，未处理的行不出现）
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl ImportResult {
    /// 出现在错误列表中的不同行号数
    pub fn failed_rows(&self) -> usize {
        self.errors
            .iter()
            .map(|e| e.row)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// 指定行的所有错误
    pub fn errors_for_row(&self, row: usize) -> Vec<&ImportRowError> {
        self.errors.iter().filter(|e| e.row == row).collect()
    }
}
