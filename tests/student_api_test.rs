// ==========================================
// StudentApi 集成测试
// ==========================================
// 测试目标: 学员 CRUD、软删除、分页与过滤
// ==========================================

mod test_helpers;

use student_registry::api::ApiError;
use student_registry::app::AppState;
use student_registry::config::config_keys;
use student_registry::domain::{
    CatalogKind, CreateStudentRequest, NewCatalogEntry, StudentFilters, StudentStatus,
    UpdateStudentRequest,
};
use student_registry::repository::{CatalogRepository, CatalogRepositoryImpl};
use test_helpers::{create_test_db, insert_test_config};
use uuid::Uuid;

struct Fixture {
    _temp_file: tempfile::NamedTempFile,
    state: AppState,
    colombia: Uuid,
    peru: Uuid,
}

async fn setup() -> Fixture {
    let (temp_file, db_path) = create_test_db().unwrap();
    let catalog = CatalogRepositoryImpl::new(&db_path).unwrap();
    let colombia = catalog
        .create(CatalogKind::Country, NewCatalogEntry::global("Colombia"))
        .await
        .unwrap();
    let peru = catalog
        .create(CatalogKind::Country, NewCatalogEntry::global("Peru"))
        .await
        .unwrap();
    let state = AppState::new(db_path).unwrap();

    Fixture {
        _temp_file: temp_file,
        state,
        colombia,
        peru,
    }
}

fn request(first: &str, email: &str, country: Uuid, enrollment_date: &str) -> CreateStudentRequest {
    CreateStudentRequest {
        first_names: first.to_string(),
        last_names: "Gomez".to_string(),
        nationality_country_id: country.to_string(),
        residence_country_id: country.to_string(),
        emails: vec![email.to_string()],
        status: "active".to_string(),
        cohort: "2024-1".to_string(),
        enrollment_date: enrollment_date.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_get_update_delete() {
    let f = setup().await;
    let api = &f.state.student_api;
    let operator = Uuid::new_v4();

    let created = api
        .create_student(request("Ana", "ana@x.com", f.colombia, "2024-01-10"), Some(operator))
        .await
        .unwrap();
    assert_eq!(created.created_by, Some(operator));

    let fetched = api.get_student(&created.id.to_string()).await.unwrap();
    assert_eq!(fetched.first_names, "Ana");
    assert_eq!(fetched.emails, vec!["ana@x.com".to_string()]);

    let updated = api
        .update_student(
            &created.id.to_string(),
            UpdateStudentRequest {
                status: Some("graduated".to_string()),
                graduation_date: Some("2025-12-01".to_string()),
                ..Default::default()
            },
            Some(operator),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, StudentStatus::Graduated);
    assert_eq!(updated.first_names, "Ana");

    api.delete_student(&created.id.to_string(), Some(operator))
        .await
        .unwrap();
    let err = api.get_student(&created.id.to_string()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 重复删除视为不存在
    let err = api
        .delete_student(&created.id.to_string(), Some(operator))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_create_rejects_underage_and_bad_code() {
    let f = setup().await;
    let api = &f.state.student_api;

    let mut young = request("Ana", "ana@x.com", f.colombia, "2024-01-10");
    young.birth_date = Some(chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string());
    let err = api.create_student(young, None).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid input: student must be at least 18 years old"
    );

    let mut bad_code = request("Ana", "ana@x.com", f.colombia, "2024-01-10");
    bad_code.student_code = Some("2026X0190".to_string());
    let err = api.create_student(bad_code, None).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref m) if m.starts_with("invalid student_code format")));
}

#[tokio::test]
async fn test_min_age_comes_from_config() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    insert_test_config(&db_path, config_keys::STUDENT_MIN_AGE, "21").unwrap();
    let colombia = CatalogRepositoryImpl::new(&db_path)
        .unwrap()
        .create(CatalogKind::Country, NewCatalogEntry::global("Colombia"))
        .await
        .unwrap();
    let state = AppState::new(db_path).unwrap();

    let mut req = request("Ana", "ana@x.com", colombia, "2024-01-10");
    let nineteen_years_ago = chrono::Utc::now().date_naive() - chrono::Duration::days(19 * 366);
    req.birth_date = Some(nineteen_years_ago.format("%Y-%m-%d").to_string());

    let err = state.student_api.create_student(req, None).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid input: student must be at least 21 years old"
    );
}

#[tokio::test]
async fn test_duplicate_document_is_conflict() {
    let f = setup().await;
    let api = &f.state.student_api;

    let mut first = request("Ana", "ana@x.com", f.colombia, "2024-01-10");
    first.document_id = Some("CC100".to_string());
    api.create_student(first, None).await.unwrap();

    let mut second = request("Eva", "eva@x.com", f.colombia, "2024-01-10");
    second.document_id = Some("CC100".to_string());
    let err = api.create_student(second, None).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn test_update_rejects_empty_email_list() {
    let f = setup().await;
    let api = &f.state.student_api;
    let created = api
        .create_student(request("Ana", "ana@x.com", f.colombia, "2024-01-10"), None)
        .await
        .unwrap();

    let err = api
        .update_student(
            &created.id.to_string(),
            UpdateStudentRequest {
                emails: Some(vec![]),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid input: at least one email is required");
}

#[tokio::test]
async fn test_invalid_id_is_invalid_input() {
    let f = setup().await;
    let err = f.state.student_api.get_student("not-a-uuid").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let f = setup().await;
    let api = &f.state.student_api;

    for (i, date) in ["2024-01-10", "2024-03-10", "2024-02-10"].iter().enumerate() {
        let email = format!("co{}@x.com", i);
        api.create_student(request(&format!("Ana{}", i), &email, f.colombia, date), None)
            .await
            .unwrap();
    }
    api.create_student(request("Luis", "luis@x.com", f.peru, "2024-04-10"), None)
        .await
        .unwrap();

    // 按入学日期倒序
    let page = api
        .list_students(StudentFilters {
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.students.len(), 2);
    assert_eq!(page.students[0].first_names, "Luis");
    assert_eq!(page.students[1].first_names, "Ana1");

    let page = api
        .list_students(StudentFilters {
            limit: 2,
            offset: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.students.len(), 2);
    assert_eq!(page.offset, 2);

    let page = api
        .list_students(StudentFilters {
            residence_country_id: Some(f.colombia),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);

    let page = api
        .list_students(StudentFilters {
            search: Some("lui".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.students[0].first_names, "Luis");

    let page = api
        .list_students(StudentFilters {
            status: Some(StudentStatus::Withdrawn),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(page.students.is_empty());
}
