//! HTTP-level tests driving the Axum router in-process.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tabula_api::{create_api_router, ApiConfig, AppState, USER_ID_HEADER};
use tabula_test_utils::{OTHER_USER, TEST_USER};
use tower::ServiceExt;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn router() -> Router {
    create_api_router(AppState::in_memory(ApiConfig::default()))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> TestResult<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Ok((status, value))
}

fn id_of(value: &Value, field: &str) -> TestResult<String> {
    value[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("missing {} in {}", field, value).into())
}

#[tokio::test]
async fn requests_without_actor_are_unauthorized() -> TestResult {
    let app = router();
    let (status, body) = send(&app, Method::GET, "/api/v1/bases", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn create_and_list_bases() -> TestResult {
    let app = router();
    let (status, base) = send(
        &app,
        Method::POST,
        "/api/v1/bases",
        Some(TEST_USER),
        Some(json!({ "name": "Roadmap", "theme": "green" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(base["name"], "Roadmap");
    assert_eq!(base["theme"], "green");

    let (status, listed) = send(&app, Method::GET, "/api/v1/bases", Some(TEST_USER), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["bases"].as_array().map(Vec::len), Some(1));
    assert_eq!(listed["bases"][0]["first_table_id"], base["tables"][0]["table_id"]);
    Ok(())
}

#[tokio::test]
async fn table_data_and_cell_edit_flow() -> TestResult {
    let app = router();
    let (_, base) = send(&app, Method::POST, "/api/v1/bases", Some(TEST_USER), Some(json!({}))).await?;
    let table_id = id_of(&base["tables"][0], "table_id")?;

    let (status, column) = send(
        &app,
        Method::POST,
        &format!("/api/v1/tables/{}/columns", table_id),
        Some(TEST_USER),
        Some(json!({ "name": "Age", "column_type": "NUMBER" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let cell_id = id_of(&column["cells"][0], "cell_id")?;

    let (status, err) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/cells/{}", cell_id),
        Some(TEST_USER),
        Some(json!({ "value": "Alice" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION_FAILED");

    let (status, cell) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/cells/{}", cell_id),
        Some(TEST_USER),
        Some(json!({ "value": "31" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cell["value"], "31");

    let (status, data) = send(
        &app,
        Method::GET,
        &format!("/api/v1/tables/{}/data?limit=2", table_id),
        Some(TEST_USER),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["rows"].as_array().map(Vec::len), Some(2));
    assert_eq!(data["next_cursor"], 1);
    assert_eq!(data["columns"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn foreign_base_is_forbidden_and_unknown_is_not_found() -> TestResult {
    let app = router();
    let (_, base) = send(&app, Method::POST, "/api/v1/bases", Some(TEST_USER), Some(json!({}))).await?;
    let base_id = id_of(&base, "base_id")?;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/bases/{}", base_id),
        Some(OTHER_USER),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/bases/{}", uuid::Uuid::now_v7()),
        Some(TEST_USER),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "BASE_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn bulk_rows_reject_out_of_range_counts() -> TestResult {
    let app = router();
    let (_, base) = send(&app, Method::POST, "/api/v1/bases", Some(TEST_USER), Some(json!({}))).await?;
    let table_id = id_of(&base["tables"][0], "table_id")?;
    let uri = format!("/api/v1/tables/{}/rows/bulk", table_id);

    let (status, _) = send(&app, Method::POST, &uri, Some(TEST_USER), Some(json!({ "row_count": 0 }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) =
        send(&app, Method::POST, &uri, Some(TEST_USER), Some(json!({ "row_count": 3 }))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["rows"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn view_lifecycle() -> TestResult {
    let app = router();
    let (_, base) = send(&app, Method::POST, "/api/v1/bases", Some(TEST_USER), Some(json!({}))).await?;
    let table_id = id_of(&base["tables"][0], "table_id")?;
    let (_, data) = send(
        &app,
        Method::GET,
        &format!("/api/v1/tables/{}/data", table_id),
        Some(TEST_USER),
        None,
    )
    .await?;
    let column_id = id_of(&data["columns"][0], "column_id")?;
    let mut visibility = serde_json::Map::new();
    visibility.insert(column_id.clone(), json!(true));

    let (status, view) = send(
        &app,
        Method::POST,
        &format!("/api/v1/tables/{}/views", table_id),
        Some(TEST_USER),
        Some(json!({
            "name": "By name",
            "config": {
                "sorting": [{ "columnId": column_id, "desc": true }],
                "filters": [],
                "columnVisibility": visibility
            }
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["config"]["sorting"][0]["desc"], true);
    let view_id = id_of(&view, "view_id")?;

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/views/{}", view_id),
        Some(TEST_USER),
        Some(json!({ "name": "Renamed" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["config"]["sorting"][0]["desc"], true);

    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/views/{}", view_id),
        Some(TEST_USER),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);
    Ok(())
}

#[tokio::test]
async fn health_and_openapi_need_no_actor() -> TestResult {
    let app = router();
    let (status, body) = send(&app, Method::GET, "/health/ready", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, doc) = send(&app, Method::GET, "/openapi.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Tabula API");
    Ok(())
}
