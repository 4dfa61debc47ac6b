use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use app_api::AppContext;
use verdant_app::{AppConfig, AppPaths, AppState, CarbonSettings, RollupMode, ensure_app_data_dir};

use http_api::HttpState;

const TEST_TOKEN: &str = "testtoken";

struct TestApp {
    _temp_dir: tempfile::TempDir,
    router: axum::Router,
}

fn build_app(ingest_token: Option<&str>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let paths = AppPaths::new(temp_dir.path().to_path_buf());
    ensure_app_data_dir(&paths).expect("ensure app data dir");
    let carbon = CarbonSettings {
        rollup_mode: RollupMode::Inline,
        ..CarbonSettings::default()
    };
    let config =
        AppConfig::new(paths.db_path, paths.intensity_defaults_path).with_carbon(carbon);
    let app_state = AppState::new(config);
    app_state.initialize().expect("initialize");

    let context = AppContext {
        app_state,
        app_data_dir: paths.app_data_dir,
    };
    let state = HttpState::new(context, ingest_token.map(str::to_string));
    let router = http_api::router(state);

    TestApp {
        _temp_dir: temp_dir,
        router,
    }
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("response");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}

fn usage_body() -> Value {
    json!({
        "source": "adf",
        "runId": "copy-1",
        "cloud": "azure",
        "regionCode": "eastus",
        "computeType": "Standard_D8_v5",
        "nodeCount": 1,
        "avgCpuUtilization": 50,
        "startedAt": "2025-01-10T00:00:00Z",
        "endedAt": "2025-01-10T02:00:00Z",
        "bytesRead": 1024
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = build_app(Some(TEST_TOKEN));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn ingest_rejects_missing_or_wrong_token() {
    let app = build_app(Some(TEST_TOKEN));

    let (status, body) = send(&app, post_json("/api/ingest/usage", usage_body(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("unauthorized"));

    let (status, _) = send(
        &app,
        post_json("/api/ingest/events", json!({}), Some("wrong")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ingest_usage_returns_estimates() {
    let app = build_app(Some(TEST_TOKEN));
    let (status, body) = send(
        &app,
        post_json("/api/ingest/usage", usage_body(), Some(TEST_TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["estKWh"], json!(0.2));
    assert_eq!(body["estCo2eKg"], json!(0.07));
    assert_eq!(body["gridIntensity_g_per_kWh"], json!(350.0));
    assert!(body.get("alert").is_none());
}

#[tokio::test]
async fn ingest_routes_are_open_without_configured_token() {
    let app = build_app(None);
    let event = json!({
        "event_type": "job_end",
        "org_id": "org",
        "project_id": "proj",
        "workload": {"external_id": "nb-1", "kind": "spark", "region": "uksouth"},
        "metrics": {"cpu_util_avg": 0.5, "nodes": 2, "bytes_read": 2048},
        "timestamps": {"started_at": "2025-01-10T00:00:00Z", "ended_at": "2025-01-10T01:00:00Z"}
    });
    let (status, body) = send(&app, post_json("/api/ingest/events", event, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["estKWh"], json!(0.12));
    assert_eq!(body["gridIntensity_g_per_kWh"], json!(230.0));
}

#[tokio::test]
async fn invalid_event_is_bad_request() {
    let app = build_app(None);
    let mut body = usage_body();
    body["avgCpuUtilization"] = json!(140);
    let (status, body) = send(&app, post_json("/api/ingest/usage", body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_input"));

    let (status, _) = send(
        &app,
        post_json("/api/ingest/usage", json!({"source": "adf"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn budget_breach_shows_up_in_alerts_and_hotspots() {
    let app = build_app(None);
    let (status, budget) = send(
        &app,
        post_json(
            "/api/budgets_put",
            json!({"source": "adf", "run_id": null, "budget_kg": 0.05}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(budget["budget_kg"], json!(0.05));

    let (_, ingested) = send(&app, post_json("/api/ingest/usage", usage_body(), None)).await;
    assert_eq!(ingested["alert"]["severity"], json!("warning"));

    let (status, alerts) = send(&app, post_json("/api/alerts", json!({}), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alerts.as_array().map(Vec::len), Some(1));
    assert_eq!(alerts[0]["kind"], json!("budget_breach"));
    assert_eq!(alerts[0]["meta"]["budgetKg"], json!(0.05));

    let (status, hotspots) = send(
        &app,
        post_json("/api/hotspots", json!({"range": "alltime"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hotspots[0]["source"], json!("adf"));
    assert_eq!(hotspots[0]["runs"], json!(1));
}

#[tokio::test]
async fn summary_and_green_score_over_explicit_range() {
    let app = build_app(None);
    send(&app, post_json("/api/ingest/usage", usage_body(), None)).await;
    let range = json!({"start": "2025-01-01T00:00:00Z", "end": "2025-02-01T00:00:00Z"});

    let (status, summary) = send(&app, post_json("/api/summary", range.clone(), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totals"]["kwh"], json!(0.2));
    assert_eq!(summary["daily"][0]["day"], json!("2025-01-10"));

    let (status, score) = send(&app, post_json("/api/green_score", range, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(score["components"]["efficiency"], json!(0.0));
    assert_eq!(score["components"]["partitioning"], json!(50.0));

    let (status, error) = send(
        &app,
        post_json("/api/green_score", json!({"target_kg_per_tb": -1.0}), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], json!("invalid_input"));
}

#[tokio::test]
async fn unknown_range_preset_is_bad_request() {
    let app = build_app(None);
    let (status, body) = send(
        &app,
        post_json("/api/summary", json!({"range": "yesterday"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_input"));
}

#[tokio::test]
async fn intensity_replace_and_settings() {
    let app = build_app(None);
    let (status, entries) = send(
        &app,
        post_json(
            "/api/intensity_replace",
            json!({"entries": [{"cloud": "aws", "region_code": "eu-north-1", "g_per_kwh": 30.0}]}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries.as_array().map(Vec::len), Some(1));

    let (status, settings) = send(&app, post_json("/api/settings_get", json!({}), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["intensity_regions"], json!(1));
    assert_eq!(settings["carbon"]["alert_delivery"], json!("best_effort"));

    let (status, _) = send(
        &app,
        post_json("/api/budgets_delete", json!({"id": 999}), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
