// ==========================================
// 学员档案系统 - 重复检测
// ==========================================
// 职责: 证件号/邮箱与库内在册学员、与本文件已成功行的重复检测
// 规则: 库内重复优先；否则查本文件已见表（仅成功创建的行入表）
// ==========================================

use crate::domain::import::ImportRowError;
use crate::importer::field_mapper::{columns, RawStudentRow};
use std::collections::{HashMap, HashSet};

pub const MSG_DUP_DOCUMENT_STORE: &str = "duplicate: student with this document already exists";
pub const MSG_DUP_EMAIL_STORE: &str = "duplicate: student with this email already exists";

/// 收集全部数据行中非空的证件号与邮箱（批量预检用）
pub fn collect_batch_keys(rows: &[RawStudentRow]) -> (Vec<String>, Vec<String>) {
    let document_ids = rows
        .iter()
        .filter(|r| !r.document_id.is_empty())
        .map(|r| r.document_id.clone())
        .collect();
    let emails = rows
        .iter()
        .filter(|r| !r.email.is_empty())
        .map(|r| r.email.clone())
        .collect();
    (document_ids, emails)
}

#[derive(Debug, Default)]
pub struct ConflictHandler {
    existing_documents: HashSet<String>,
    existing_emails: HashSet<String>,
    /// 值 → 首次成功创建的行号
    seen_documents: HashMap<String, usize>,
    seen_emails: HashMap<String, usize>,
}

impl ConflictHandler {
    pub fn new(existing_documents: HashSet<String>, existing_emails: HashSet<String>) -> Self {
        Self {
            existing_documents,
            existing_emails,
            ..Default::default()
        }
    }

    /// 检测一行的重复项
    pub fn check(&self, row: &RawStudentRow) -> Vec<ImportRowError> {
        let mut errors = Vec::new();

        if !row.document_id.is_empty() {
            if self.existing_documents.contains(&row.document_id) {
                errors.push(ImportRowError::new(
                    row.row_number,
                    columns::DOCUMENT_ID,
                    row.document_id.as_str(),
                    MSG_DUP_DOCUMENT_STORE,
                ));
            } else if let Some(prev) = self.seen_documents.get(&row.document_id) {
                errors.push(ImportRowError::new(
                    row.row_number,
                    columns::DOCUMENT_ID,
                    row.document_id.as_str(),
                    format!("duplicate: same document_id as row {} in this file", prev),
                ));
            }
        }

        if !row.email.is_empty() {
            if self.existing_emails.contains(&row.email) {
                errors.push(ImportRowError::new(
                    row.row_number,
                    columns::EMAIL,
                    row.email.as_str(),
                    MSG_DUP_EMAIL_STORE,
                ));
            } else if let Some(prev) = self.seen_emails.get(&row.email) {
                errors.push(ImportRowError::new(
                    row.row_number,
                    columns::EMAIL,
                    row.email.as_str(),
                    format!("duplicate: same email as row {} in this file", prev),
                ));
            }
        }

        errors
    }

    /// 行创建成功后登记（空值不登记）
    pub fn mark_seen(&mut self, row: &RawStudentRow) {
        if !row.document_id.is_empty() {
            self.seen_documents
                .insert(row.document_id.clone(), row.row_number);
        }
        if !row.email.is_empty() {
            self.seen_emails.insert(row.email.clone(), row.row_number);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: usize, doc: &str, email: &str) -> RawStudentRow {
        RawStudentRow {
            row_number: n,
            document_id: doc.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_store_duplicate_takes_precedence() {
        let mut handler = ConflictHandler::new(
            HashSet::from(["D1".to_string()]),
            HashSet::new(),
        );
        handler.mark_seen(&row(2, "D1", ""));

        let errors = handler.check(&row(3, "D1", ""));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, MSG_DUP_DOCUMENT_STORE);
    }

    #[test]
    fn test_intra_file_duplicate_references_first_row() {
        let mut handler = ConflictHandler::default();
        let first = row(2, "", "ana@x.com");
        assert!(handler.check(&first).is_empty());
        handler.mark_seen(&first);

        let errors = handler.check(&row(5, "", "ana@x.com"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[0].message, "duplicate: same email as row 2 in this file");
    }

    #[test]
    fn test_empty_values_never_seen() {
        let mut handler = ConflictHandler::default();
        handler.mark_seen(&row(2, "", ""));
        assert!(handler.check(&row(3, "", "")).is_empty());
    }

    #[test]
    fn test_collect_batch_keys_skips_empty() {
        let rows = vec![row(2, "A", ""), row(3, "", "b@x.com"), row(4, "", "")];
        let (docs, emails) = collect_batch_keys(&rows);
        assert_eq!(docs, vec!["A".to_string()]);
        assert_eq!(emails, vec!["b@x.com".to_string()]);
    }
}
