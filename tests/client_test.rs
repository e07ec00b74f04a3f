//! Exercises the HTTP client against a local stub speaking the remote
//! hosted-record shapes: mapping-of-records reads, single-record
//! writes, empty-body deletes, and error bodies.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use kursverwaltung::living_apps::{LivingAppsConfig, LivingAppsHttpClient, RecordStore};

const CATEGORIES_APP: &str = "aaaaaaaaaaaaaaaaaaaaaaaa";
const COURSES_APP: &str = "bbbbbbbbbbbbbbbbbbbbbbbb";
const BROKEN_APP: &str = "cccccccccccccccccccccccc";
const ART_ID: &str = "698dcc61d32d3b471f096328";
const CREATED_ID: &str = "dddddddddddddddddddddddd";

async fn list_records(Path(app_id): Path<String>) -> Response {
    match app_id.as_str() {
        CATEGORIES_APP => Json(json!({
            "698dcc61d32d3b471f096328": {
                "fields": {"name": "Art"},
                "createdat": "2026-01-01T00:00:00Z",
                "updatedat": null
            },
            "698dcc61d32d3b471f096329": {
                "fields": {},
                "createdat": "2026-01-02T00:00:00Z",
                "updatedat": "2026-01-03T00:00:00Z"
            }
        }))
        .into_response(),
        COURSES_APP => Json(json!({})).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "session expired").into_response(),
    }
}

async fn create_record(Path(app_id): Path<String>, Json(body): Json<Value>) -> Response {
    if app_id == BROKEN_APP {
        return (StatusCode::BAD_REQUEST, "unknown app").into_response();
    }
    Json(json!({
        "id": CREATED_ID,
        "fields": body["fields"],
        "createdat": "2026-01-01T00:00:00Z",
        "updatedat": null
    }))
    .into_response()
}

async fn get_record(Path((_app_id, id)): Path<(String, String)>) -> Response {
    if id == ART_ID {
        Json(json!({
            "id": ART_ID,
            "fields": {"name": "Art"},
            "createdat": "2026-01-01T00:00:00Z",
            "updatedat": null
        }))
        .into_response()
    } else {
        (StatusCode::NOT_FOUND, "").into_response()
    }
}

async fn update_record(Path((_app_id, id)): Path<(String, String)>, Json(body): Json<Value>) -> Response {
    Json(json!({
        "id": id,
        "fields": body["fields"],
        "createdat": "2026-01-01T00:00:00Z",
        "updatedat": "2026-01-04T00:00:00Z"
    }))
    .into_response()
}

async fn delete_record(Path((_app_id, id)): Path<(String, String)>) -> Response {
    if id == "missing00000000000000000" {
        return (StatusCode::NOT_FOUND, "no such record").into_response();
    }
    // empty, non-JSON body on success
    (StatusCode::OK, "").into_response()
}

/// Binds the stub on an ephemeral port and returns a base URL of the
/// same shape as the real service (`http://host:port/rest`).
async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/rest/apps/{app_id}/records", get(list_records).post(create_record))
        .route(
            "/rest/apps/{app_id}/records/{id}",
            get(get_record).patch(update_record).delete(delete_record),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub listener");
    let addr = listener.local_addr().expect("stub has no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server failed");
    });
    format!("http://{}/rest", addr)
}

fn client(base_url: String, courses_app_id: &str) -> LivingAppsHttpClient {
    LivingAppsHttpClient::new(LivingAppsConfig {
        base_url,
        categories_app_id: CATEGORIES_APP.to_string(),
        courses_app_id: courses_app_id.to_string(),
        session_cookie: None,
    })
    .expect("failed to build client")
}

#[tokio::test]
async fn list_normalizes_record_map_and_injects_ids() {
    let base = spawn_stub().await;
    let client = client(base, COURSES_APP);

    let mut records = client.list_categories().await.expect("list failed");
    records.sort_by(|a, b| a.record_id.cmp(&b.record_id));

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].record_id, "698dcc61d32d3b471f096328");
    assert_eq!(records[0].fields.name.as_deref(), Some("Art"));
    assert_eq!(records[1].record_id, "698dcc61d32d3b471f096329");
    assert_eq!(records[1].fields.name, None);
    assert_eq!(records[1].updatedat.as_deref(), Some("2026-01-03T00:00:00Z"));
}

#[tokio::test]
async fn transport_error_carries_response_body_text() {
    let base = spawn_stub().await;
    let client = client(base, BROKEN_APP);

    let err = client.list_courses().await.expect_err("list should fail");
    let message = err.to_string();
    assert!(message.contains("500"), "unexpected error: {}", message);
    assert!(message.contains("session expired"), "unexpected error: {}", message);
}

#[tokio::test]
async fn get_returns_record_or_none() {
    let base = spawn_stub().await;
    let client = client(base, COURSES_APP);

    let record = client
        .get_category(ART_ID)
        .await
        .expect("get failed")
        .expect("record missing");
    assert_eq!(record.record_id, ART_ID);
    assert_eq!(record.fields.name.as_deref(), Some("Art"));

    let absent = client
        .get_category("698dcc61d32d3b471f09632f")
        .await
        .expect("get failed");
    assert!(absent.is_none());
}

#[tokio::test]
async fn create_and_update_round_trip_fields() {
    use kursverwaltung::living_apps::dto::CategoryFields;

    let base = spawn_stub().await;
    let client = client(base, COURSES_APP);

    let created = client
        .create_category(&CategoryFields { name: Some("Musik".to_string()) })
        .await
        .expect("create failed");
    assert_eq!(created.record_id, CREATED_ID);
    assert_eq!(created.fields.name.as_deref(), Some("Musik"));

    let updated = client
        .update_category(ART_ID, &CategoryFields { name: Some("Kunst".to_string()) })
        .await
        .expect("update failed");
    assert_eq!(updated.record_id, ART_ID);
    assert_eq!(updated.fields.name.as_deref(), Some("Kunst"));
    assert_eq!(updated.updatedat.as_deref(), Some("2026-01-04T00:00:00Z"));
}

#[tokio::test]
async fn delete_with_empty_body_resolves_as_success() {
    let base = spawn_stub().await;
    let client = client(base, COURSES_APP);

    let deleted = client.delete_category(ART_ID).await.expect("delete failed");
    assert!(deleted);
}

#[tokio::test]
async fn delete_failure_is_a_transport_error() {
    let base = spawn_stub().await;
    let client = client(base, COURSES_APP);

    let err = client
        .delete_category("missing00000000000000000")
        .await
        .expect_err("delete should fail");
    assert!(err.to_string().contains("no such record"));
}
