//! Integration tests for the slat-server API
//!
//! Drives the full router through `tower::ServiceExt::oneshot` against a
//! fresh on-disk database per test: CSV upload, batch assignment,
//! annotation, progress reporting, and the auth middleware.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use slat_common::db::init_database;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use slat_server::{build_router, AppState};

/// Test helper: fresh database in a temp directory
async fn setup_test_db() -> (SqlitePool, TempDir) {
    let dir = TempDir::new().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("slat-test.db"))
        .await
        .expect("Should initialize test database");
    (pool, dir)
}

/// Test helper: app with auth disabled (empty secret)
fn setup_app(db: SqlitePool) -> axum::Router {
    build_router(AppState::new(db, String::new()))
}

/// Test helper: insert a user, returning its guid
async fn insert_user(pool: &SqlitePool, name: &str, role: &str) -> String {
    let guid = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO users (guid, name, email, role) VALUES (?, ?, ?, ?)")
        .bind(&guid)
        .bind(name)
        .bind(format!("{}@example.com", guid))
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
    guid
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart upload with a single `file` field
fn csv_upload_request(content: &str) -> Request<Body> {
    let boundary = "slat-test-boundary";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"sentences.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{b}--\r\n",
        b = boundary,
        content = content
    );
    Request::builder()
        .method("POST")
        .uri("/api/admin/upload-csv")
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "slat-server");
    assert!(body["version"].is_string());
}

// =============================================================================
// CSV upload
// =============================================================================

#[tokio::test]
async fn test_upload_deduplicates_and_indexes() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db.clone());

    let response = app.oneshot(csv_upload_request("sentence\na\nb\na")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["inserted"], 2);
    assert_eq!(body["skippedDuplicates"], 1);
    assert_eq!(body["message"], "CSV uploaded: 2 sentences inserted.");

    let rows: Vec<(String, i64)> = sqlx::query_as("SELECT text, idx FROM sentences ORDER BY idx")
        .fetch_all(&db)
        .await
        .unwrap();
    assert_eq!(rows, vec![("a".to_string(), 0), ("b".to_string(), 1)]);
}

#[tokio::test]
async fn test_upload_without_file_field_rejected() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let boundary = "slat-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/upload-csv")
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_upload_with_no_valid_rows_rejected() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app.oneshot(csv_upload_request("sentence\n   \n")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Batch assignment
// =============================================================================

#[tokio::test]
async fn test_assignment_scenario() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db.clone());

    // Upload 2 sentences (duplicate skipped)
    let response = app
        .clone()
        .oneshot(csv_upload_request("sentence\na\nb\na"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // First assignment of 0-499 covers both sentences
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": user_id, "startIndex": 0, "batchSize": 500}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["batchStart"], 0);
    assert_eq!(body["batchEnd"], 499);
    assert_eq!(body["newlyAssigned"], 2);
    assert_eq!(body["duplicatesAlreadyOwned"], 0);
    assert_eq!(body["conflictsAssignedToOthers"], 0);

    // Second identical call: already fully assigned, no counter
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": user_id, "startIndex": 0, "batchSize": 500}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["message"].as_str().unwrap().contains("already fully assigned"));
    assert!(body.get("newlyAssigned").is_none());

    // Exactly one ledger record
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batch_assignments")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_assignment_gap_fill_after_second_upload() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db.clone());

    app.clone().oneshot(csv_upload_request("sentence\na\nb")).await.unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": user_id, "startIndex": 0, "batchSize": 500}),
        ))
        .await
        .unwrap();

    // Later upload adds sentences inside the already-assigned window
    app.clone().oneshot(csv_upload_request("sentence\nc\nd")).await.unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": user_id, "startIndex": 0, "batchSize": 500}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["message"].as_str().unwrap().starts_with("Gap fill complete"));
    assert_eq!(body["newlyAssigned"], 2);
}

#[tokio::test]
async fn test_assignment_default_batch_size() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db.clone());

    app.clone().oneshot(csv_upload_request("sentence\na")).await.unwrap();

    // No batchSize in the body: the default_batch_size setting (500) applies
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": user_id, "startIndex": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["batchEnd"], 499);
}

#[tokio::test]
async fn test_assignment_empty_range() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": user_id, "startIndex": 10000, "batchSize": 500}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "RANGE_EMPTY");
}

#[tokio::test]
async fn test_assignment_unknown_user() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db.clone());

    app.clone().oneshot(csv_upload_request("sentence\na")).await.unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": Uuid::new_v4().to_string(), "startIndex": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_assignment_invalid_arguments() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": user_id, "startIndex": -1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Annotation and the annotator work list
// =============================================================================

#[tokio::test]
async fn test_annotate_upsert_and_work_list() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db.clone());

    app.clone().oneshot(csv_upload_request("sentence\na\nb")).await.unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": user_id, "startIndex": 0, "batchSize": 500}),
        ))
        .await
        .unwrap();

    let sentence_id: String = sqlx::query_scalar("SELECT guid FROM sentences WHERE idx = 0")
        .fetch_one(&db)
        .await
        .unwrap();

    // Annotate twice with different labels: one entry, latest labels win
    for labels in [json!(["positive"]), json!(["negative", "irony"])] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/user/annotate/{}", sentence_id),
                json!({"userId": user_id, "labels": labels}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get_request(&format!("/api/user/assigned-sentences/{}", user_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    let sentences = body.as_array().unwrap();
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0]["index"], 0);
    assert_eq!(sentences[0]["annotations"].as_array().unwrap().len(), 1);
    assert_eq!(sentences[0]["annotations"][0]["labels"], json!(["negative", "irony"]));
    assert!(sentences[1]["annotations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_annotate_invalid_ids() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db);

    // Malformed sentence id
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/user/annotate/not-a-uuid",
            json!({"userId": user_id, "labels": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Well-formed but unknown sentence id
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/user/annotate/{}", Uuid::new_v4()),
            json!({"userId": user_id, "labels": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assigned_sentences_empty_ledger() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db);

    let response = app
        .oneshot(get_request(&format!("/api/user/assigned-sentences/{}", user_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!([]));
}

// =============================================================================
// Progress reporting
// =============================================================================

#[tokio::test]
async fn test_progress_math() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db.clone());

    // Two ledger records of 500 and 300, no annotations
    for (start, size) in [(0, 500), (1000, 300)] {
        sqlx::query(
            "INSERT INTO batch_assignments (guid, user_id, batch_start, batch_end, batch_size)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user_id)
        .bind(start)
        .bind(start + size - 1)
        .bind(size)
        .execute(&db)
        .await
        .unwrap();
    }

    let response = app
        .oneshot(get_request(&format!("/api/admin/progress/{}", user_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totalAssigned"], 800);
    assert_eq!(body["annotated"], 0);
    assert_eq!(body["progressPercentage"], 0);
}

#[tokio::test]
async fn test_progress_zero_assignments() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db);

    let response = app
        .oneshot(get_request(&format!("/api/admin/progress/{}", user_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totalAssigned"], 0);
    assert_eq!(body["progressPercentage"], 0);
}

#[tokio::test]
async fn test_all_assignments_sorted_and_filtered() {
    let (db, _dir) = setup_test_db().await;
    insert_user(&db, "bob", "user").await;
    insert_user(&db, "Alice", "user").await;
    insert_user(&db, "Root", "admin").await;
    let app = setup_app(db);

    let response = app.oneshot(get_request("/api/admin/assignments")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["userName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alice", "bob"]);
}

#[tokio::test]
async fn test_user_assignment_detail() {
    let (db, _dir) = setup_test_db().await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let app = setup_app(db.clone());

    app.clone().oneshot(csv_upload_request("sentence\na\nb")).await.unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/assign",
            json!({"userId": user_id, "startIndex": 0, "batchSize": 2}),
        ))
        .await
        .unwrap();

    let sentence_id: String = sqlx::query_scalar("SELECT guid FROM sentences WHERE idx = 1")
        .fetch_one(&db)
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/user/annotate/{}", sentence_id),
            json!({"userId": user_id, "labels": ["x"]}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request(&format!("/api/admin/assignments/{}", user_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["user"]["name"], "Ada");
    assert_eq!(body["batches"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalAssigned"], 2);
    assert_eq!(body["annotated"], 1);
    assert_eq!(body["progressPercentage"], 50);
    assert_eq!(body["assignments"][0]["isAnnotated"], false);
    assert_eq!(body["assignments"][1]["isAnnotated"], true);
}

// =============================================================================
// Authentication middleware
// =============================================================================

#[tokio::test]
async fn test_auth_missing_and_garbage_tokens() {
    let (db, _dir) = setup_test_db().await;
    let app = build_router(AppState::new(db, "test-secret".to_string()));

    let response = app.clone().oneshot(get_request("/api/admin/assignments")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("GET")
        .uri("/api/admin/assignments")
        .header("authorization", "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_role_enforcement() {
    let (db, _dir) = setup_test_db().await;
    let admin_id = insert_user(&db, "Root", "admin").await;
    let user_id = insert_user(&db, "Ada", "user").await;
    let secret = "test-secret";
    let app = build_router(AppState::new(db, secret.to_string()));

    let admin_token = slat_common::auth::encode_token(&admin_id, "admin", secret, 3600).unwrap();
    let user_token = slat_common::auth::encode_token(&user_id, "user", secret, 3600).unwrap();

    // Admin token on an admin route passes
    let request = Request::builder()
        .method("GET")
        .uri("/api/admin/assignments")
        .header("authorization", format!("Bearer {}", admin_token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // User token on an admin route is forbidden
    let request = Request::builder()
        .method("GET")
        .uri("/api/admin/assignments")
        .header("authorization", format!("Bearer {}", user_token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // User token on a user route passes
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/user/assigned-sentences/{}", user_id))
        .header("authorization", format!("Bearer {}", user_token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_disabled_with_empty_secret() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    // No token at all, but auth is disabled
    let response = app.oneshot(get_request("/api/admin/assignments")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// User directory
// =============================================================================

#[tokio::test]
async fn test_list_users_excludes_admins() {
    let (db, _dir) = setup_test_db().await;
    let ada = insert_user(&db, "Ada", "user").await;
    insert_user(&db, "Root", "admin").await;
    let app = setup_app(db);

    let response = app.oneshot(get_request("/api/admin/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["userId"], ada);
    assert_eq!(users[0]["name"], "Ada");
    assert_eq!(users[0]["email"], format!("{}@example.com", ada));
    // Identity only: no role, no internal column names
    assert!(users[0].get("role").is_none());
    assert!(users[0].get("guid").is_none());
}
