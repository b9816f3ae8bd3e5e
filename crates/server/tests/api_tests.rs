//! Integration tests for the cost API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vmcost_lib::{
    health::{components, HealthRegistry},
    CostMetrics, Inventory, StructuredLogger,
};
use vmcost_server::api::{create_router, AppState};

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::INVENTORY).await;
    health_registry.register(components::COST_MODEL).await;
    health_registry.register(components::SESSION).await;

    let state = Arc::new(AppState::new(
        Inventory::sample(),
        "USD",
        health_registry,
        CostMetrics::new(),
        StructuredLogger::new("test"),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

async fn post(app: &Router, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method("POST").uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

fn approx(value: &Value, expected: f64) -> bool {
    value
        .as_f64()
        .map(|v| (v - expected).abs() < 1e-6)
        .unwrap_or(false)
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app().await;
    state
        .health_registry
        .set_degraded(components::COST_MODEL, "Monthly total is not finite")
        .await;

    let (status, health) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app().await;
    state
        .health_registry
        .set_unhealthy(components::INVENTORY, "Inventory file unreadable")
        .await;

    let (status, health) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_follows_registry() {
    let (app, state) = setup_test_app().await;

    let (status, readiness) = get(&app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    state.health_registry.set_ready(true).await;
    let (status, readiness) = get(&app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app().await;
    get(&app, "/api/v1/costs").await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("vmcost_total_monthly_cost"));
}

#[tokio::test]
async fn test_inventory_overview() {
    let (app, _state) = setup_test_app().await;

    let (status, overview) = get(&app, "/api/v1/inventory").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["vmCount"], 20);
    assert_eq!(overview["hostCount"], 5);
    assert_eq!(overview["datastoreCount"], 3);
    assert_eq!(overview["totalVCPU"], 160);
    assert!(approx(&overview["totalHardwareInvestment"], 125000.0));

    let (_, vms) = get(&app, "/api/v1/inventory/vms").await;
    assert_eq!(vms.as_array().unwrap().len(), 20);
    assert_eq!(vms[0]["powerState"], "poweredOn");

    let (_, datastores) = get(&app, "/api/v1/inventory/datastores").await;
    assert_eq!(datastores[0]["type"], "SSD");
}

#[tokio::test]
async fn test_costs_total_matches_vm_rows() {
    let (app, _state) = setup_test_app().await;

    let (status, summary) = get(&app, "/api/v1/costs").await;
    assert_eq!(status, StatusCode::OK);
    let total = summary["totalMonthly"].as_f64().unwrap();
    assert!(approx(&summary["totalDaily"], total / 30.0));

    let department_sum: f64 = summary["byDepartment"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_f64().unwrap())
        .sum();
    assert!((department_sum - total).abs() < 1e-6);

    let (_, rows) = get(&app, "/api/v1/costs/vms").await;
    let row_sum: f64 = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["monthlyCost"].as_f64().unwrap())
        .sum();
    assert!((row_sum - total).abs() < 1e-6);
}

#[tokio::test]
async fn test_advanced_costs_with_default_profile() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post(&app, "/api/v1/costs/advanced", None).await;
    assert_eq!(status, StatusCode::OK);
    let vms = body["vms"].as_array().unwrap();
    assert_eq!(vms.len(), 20);
    // every VM carries (5000 + 25000) / 25 of shared cost
    assert!(vms
        .iter()
        .all(|vm| vm["monthlyCost"].as_f64().unwrap() >= 1200.0));
    assert_eq!(body["profile"]["environmentMultipliers"]["Production"], 1.5);
}

#[tokio::test]
async fn test_advanced_costs_with_posted_profile() {
    let (app, _state) = setup_test_app().await;
    let profile = json!({
        "baseProfile": {
            "cpuCostPerCoreMonth": 0.0,
            "memoryCostPerGBMonth": 0.0,
            "storageCostPerGBMonth": 0.0,
            "powerCoolingPerVMMonth": 0.0,
            "softwareLicensePerVMMonth": 0.0
        },
        "facilitiesCostPerMonth": 250.0,
        "staffCostPerMonth": 0.0
    });

    let (status, body) = post(&app, "/api/v1/costs/advanced", Some(profile)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(approx(&body["totalMonthly"], 20.0 * 10.0));
}

#[tokio::test]
async fn test_optimizations_on_sample() {
    let (app, _state) = setup_test_app().await;

    let (status, report) = get(&app, "/api/v1/optimizations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["zombies"], json!(["vm-007", "vm-008"]));
    assert_eq!(report["poweredOff"], json!(["vm-005", "vm-013", "vm-016"]));
    assert!(approx(&report["totalSavingsOpportunity"], 3400.0));
    assert!(approx(&report["missingTagPercent"], 10.0));
}

#[tokio::test]
async fn test_quick_setup_flow() {
    let (app, _state) = setup_test_app().await;

    let (status, session) = post(&app, "/api/v1/session/path", Some(json!({"path": "quick"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["state"]["state"], "quick");
    assert_eq!(session["state"]["setup"]["detected"]["vmCount"], 20);

    let (status, _) = post(
        &app,
        "/api/v1/session/quick",
        Some(json!({"adjustmentPct": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, session) = post(&app, "/api/v1/session/quick/apply", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["state"]["state"], "complete");
    assert_eq!(session["state"]["path"], "quick");

    let (_, profile) = get(&app, "/api/v1/profile").await;
    assert!(approx(&profile["profile"]["cpuCostPerCoreMonth"], 55.0));
    assert_eq!(profile["completedPath"], "quick");
    assert_eq!(profile["currency"], "USD");
}

#[tokio::test]
async fn test_quick_adjustment_out_of_range_is_422() {
    let (app, _state) = setup_test_app().await;
    post(&app, "/api/v1/session/path", Some(json!({"path": "quick"}))).await;

    let (status, error) = post(
        &app,
        "/api/v1/session/quick",
        Some(json!({"adjustmentPct": 80})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], "out_of_range");

    let (_, session) = get(&app, "/api/v1/session").await;
    assert_eq!(session["state"]["setup"]["adjustmentPct"], 0);
}

#[tokio::test]
async fn test_invalid_transition_is_409() {
    let (app, _state) = setup_test_app().await;

    let (status, error) = post(&app, "/api/v1/session/guided/next", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "invalid_transition");

    let (status, _) = post(&app, "/api/v1/session/back", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_path_is_422() {
    let (app, _state) = setup_test_app().await;

    let (status, error) = post(&app, "/api/v1/session/path", Some(json!({"path": "expert"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], "unknown_path");
}

#[tokio::test]
async fn test_guided_setup_flow() {
    let (app, _state) = setup_test_app().await;
    post(&app, "/api/v1/session/path", Some(json!({"path": "guided"}))).await;

    let (status, _) = post(
        &app,
        "/api/v1/session/guided",
        Some(json!({"staffAllocationMonthly": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = post(&app, "/api/v1/session/guided/complete", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "step_incomplete");

    for _ in 0..3 {
        let (status, _) = post(&app, "/api/v1/session/guided/next", None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, session) = post(&app, "/api/v1/session/guided/complete", None).await;
    assert_eq!(status, StatusCode::OK);
    // (5000 + 3000 + 2000 + 0) / 20
    assert!(approx(&session["profile"]["powerCoolingPerVMMonth"], 500.0));
}

#[tokio::test]
async fn test_advanced_setup_flow() {
    let (app, _state) = setup_test_app().await;
    post(&app, "/api/v1/session/path", Some(json!({"path": "advanced"}))).await;

    let (status, session) = post(
        &app,
        "/api/v1/session/advanced",
        Some(json!({"formula": "return 42;"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["state"]["setup"]["formula"], "return 42;");

    let (_, session) = post(&app, "/api/v1/session/advanced/apply", None).await;
    assert!(approx(&session["profile"]["cpuCostPerCoreMonth"], 75.0));
    assert!(approx(&session["profile"]["softwareLicensePerVMMonth"], 100.0));
}

#[tokio::test]
async fn test_demo_flow() {
    let (app, _state) = setup_test_app().await;
    post(&app, "/api/v1/session/path", Some(json!({"path": "demo"}))).await;

    let (status, _) = post(&app, "/api/v1/session/demo/next", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    for _ in 0..3 {
        post(&app, "/api/v1/session/demo/complete-step", None).await;
        let (status, _) = post(&app, "/api/v1/session/demo/next", None).await;
        assert_eq!(status, StatusCode::OK);
    }
    post(&app, "/api/v1/session/demo/complete-step", None).await;

    let (status, session) = post(&app, "/api/v1/session/demo/goto/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["state"]["flow"]["current"], "buildProfile");

    let (status, _) = post(&app, "/api/v1/session/demo/goto/9", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, session) = post(&app, "/api/v1/session/demo/finish", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["state"]["path"], "demo");
    assert!(approx(&session["profile"]["powerCoolingPerVMMonth"], 400.0));
}

#[tokio::test]
async fn test_reset_restores_default_profile() {
    let (app, _state) = setup_test_app().await;
    post(&app, "/api/v1/session/path", Some(json!({"path": "advanced"}))).await;
    post(&app, "/api/v1/session/advanced/apply", None).await;

    let (status, session) = post(&app, "/api/v1/session/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["state"]["state"], "pathSelection");
    assert!(approx(&session["profile"]["cpuCostPerCoreMonth"], 50.0));
}

#[tokio::test]
async fn test_focus_export_for_month() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(&app, "/api/v1/focus?year=2025&month=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["billingPeriod"]["start"], "2025-01-01T00:00:00Z");
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 20);
    assert_eq!(records[0]["ResourceId"], "vm-001");
    assert_eq!(records[0]["ServiceCategory"], "Compute");

    let (status, _) = get(&app, "/api/v1/focus?year=2025").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_focus_line_items() {
    let (app, _state) = setup_test_app().await;

    let (status, items) = get(&app, "/api/v1/focus/line-items").await;
    assert_eq!(status, StatusCode::OK);
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 60);
    assert_eq!(items[0]["ResourceId"], "vm-001-cpu");
    assert_eq!(items[0]["ResourceType"], "vCPU");
}
