//! HTTP API: health, metrics, inventory, costs, optimizations, setup session
//! and FOCUS export

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{error, info};
use vmcost_lib::{
    calculate_advanced_vm_cost, calculate_total_costs, enrich_with_costs,
    health::{ComponentStatus, HealthRegistry},
    identify_optimization_opportunities,
    inventory::InventorySummary,
    lookup_line_items, vm_cost_lines,
    workflow::{DemoStep, GuidedInputsUpdate},
    AdvancedCostProfile, BillingPeriod, CostMetrics, CostProfile, CostSummary, Datastore,
    FocusRecord, Host, Inventory, LineItem, OptimizationSummary, Session, SessionAction,
    SessionState, SetupPath, StructuredLogger, VirtualMachine, VmCost, WorkflowError,
};

/// Shared application state
pub struct AppState {
    pub inventory: Arc<Inventory>,
    pub session: RwLock<Session>,
    pub health_registry: HealthRegistry,
    pub metrics: CostMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        inventory: Inventory,
        currency: impl Into<String>,
        health_registry: HealthRegistry,
        metrics: CostMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            inventory: Arc::new(inventory),
            session: RwLock::new(Session::new(currency)),
            health_registry,
            metrics,
            logger,
        }
    }
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Workflow(WorkflowError),
    BadRequest(String),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError::Workflow(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Workflow(WorkflowError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "invalid_transition")
            }
            ApiError::Workflow(WorkflowError::StepIncomplete { .. }) => {
                (StatusCode::CONFLICT, "step_incomplete")
            }
            ApiError::Workflow(WorkflowError::AdjustmentOutOfRange { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "out_of_range")
            }
            ApiError::Workflow(WorkflowError::UnknownPath(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unknown_path")
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let message = match self {
            ApiError::Workflow(err) => err.to_string(),
            ApiError::BadRequest(message) => message,
        };

        (
            status,
            Json(ErrorResponse {
                error: kind.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

// Health and metrics

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

// Inventory

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryOverview {
    #[serde(flatten)]
    pub summary: InventorySummary,
    pub total_hardware_investment: f64,
    pub total_host_cores: u64,
    #[serde(rename = "totalHostMemoryGB")]
    pub total_host_memory_gb: f64,
}

async fn inventory(State(state): State<Arc<AppState>>) -> Json<InventoryOverview> {
    let inventory = &state.inventory;
    Json(InventoryOverview {
        summary: inventory.summary(),
        total_hardware_investment: inventory.total_hardware_investment(),
        total_host_cores: inventory.total_host_cores(),
        total_host_memory_gb: inventory.total_host_memory_gb(),
    })
}

async fn inventory_vms(State(state): State<Arc<AppState>>) -> Json<Vec<VirtualMachine>> {
    Json(state.inventory.vms.clone())
}

async fn inventory_hosts(State(state): State<Arc<AppState>>) -> Json<Vec<Host>> {
    Json(state.inventory.hosts.clone())
}

async fn inventory_datastores(State(state): State<Arc<AppState>>) -> Json<Vec<Datastore>> {
    Json(state.inventory.datastores.clone())
}

// Profile and costs

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: CostProfile,
    pub completed_path: Option<SetupPath>,
    pub currency: String,
}

async fn profile(State(state): State<Arc<AppState>>) -> Json<ProfileResponse> {
    let session = state.session.read().await;
    Json(ProfileResponse {
        profile: session.profile,
        completed_path: session.completed_path(),
        currency: session.currency.clone(),
    })
}

async fn costs(State(state): State<Arc<AppState>>) -> Json<CostSummary> {
    let profile = state.session.read().await.profile;

    let started = Instant::now();
    let summary = calculate_total_costs(&state.inventory.vms, &profile);
    state
        .metrics
        .observe_calculation_latency(started.elapsed().as_secs_f64());
    state.metrics.set_total_monthly_cost(summary.total_monthly);

    state
        .health_registry
        .record_monthly_total(summary.total_monthly)
        .await;
    state
        .logger
        .log_cost_summary(&summary, state.inventory.vms.len());

    Json(summary)
}

async fn vm_costs(State(state): State<Arc<AppState>>) -> Json<Vec<VmCost>> {
    let profile = state.session.read().await.profile;
    Json(vm_cost_lines(&state.inventory.vms, &profile))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedVmCost {
    pub id: String,
    pub name: String,
    pub environment: Option<String>,
    pub department: Option<String>,
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedCostResponse {
    pub profile: AdvancedCostProfile,
    pub vms: Vec<AdvancedVmCost>,
    pub total_monthly: f64,
}

/// Costs under a posted advanced profile; defaults when the body is absent
async fn advanced_costs(
    State(state): State<Arc<AppState>>,
    body: Option<Json<AdvancedCostProfile>>,
) -> Json<AdvancedCostResponse> {
    let profile = body.map(|Json(p)| p).unwrap_or_default();

    let vms: Vec<AdvancedVmCost> = state
        .inventory
        .vms
        .iter()
        .map(|vm| AdvancedVmCost {
            id: vm.id.clone(),
            name: vm.name.clone(),
            environment: vm.tags.environment.clone(),
            department: vm.tags.department.clone(),
            monthly_cost: calculate_advanced_vm_cost(vm, &profile),
        })
        .collect();
    let total_monthly = vms.iter().map(|vm| vm.monthly_cost).sum();

    Json(AdvancedCostResponse {
        profile,
        vms,
        total_monthly,
    })
}

// Optimizations

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResponse {
    #[serde(flatten)]
    pub summary: OptimizationSummary,
    pub total_monthly: f64,
    /// Savings as a share of the monthly total; absent when the total is zero
    pub savings_percent: Option<f64>,
    pub missing_tag_percent: Option<f64>,
}

async fn optimizations(State(state): State<Arc<AppState>>) -> Json<OptimizationResponse> {
    let profile = state.session.read().await.profile;
    let vms = &state.inventory.vms;

    let report = identify_optimization_opportunities(vms);
    let total_monthly = calculate_total_costs(vms, &profile).total_monthly;
    state
        .metrics
        .set_savings_opportunity(report.total_savings_opportunity);
    state.logger.log_optimization_scan(&report);

    Json(OptimizationResponse {
        summary: report.to_summary(),
        total_monthly,
        savings_percent: Some(report.savings_percent_of(total_monthly)).filter(|p| p.is_finite()),
        missing_tag_percent: Some(report.missing_tag_percent(vms.len()))
            .filter(|p| p.is_finite()),
    })
}

// Session

/// Apply one action to the session under the write lock
async fn transition(state: &AppState, action: SessionAction) -> Result<Json<Session>, ApiError> {
    let mut session = state.session.write().await;
    let selected = match &action {
        SessionAction::SelectPath { path } => Some(*path),
        _ => None,
    };
    let was_complete = matches!(session.state, SessionState::Complete { .. });

    match session.clone().apply(action, &state.inventory) {
        Ok(next) => {
            if let Some(path) = selected {
                state.logger.log_path_selected(path);
            }
            if let (false, Some(path)) = (was_complete, next.completed_path()) {
                state.metrics.inc_profiles_applied(path);
                state
                    .logger
                    .log_profile_applied(path, next.profile.cpu_cost_per_core_month);
            }
            *session = next;
            Ok(Json(session.clone()))
        }
        Err(err) => {
            state.metrics.inc_workflow_errors(&err);
            state.logger.log_workflow_rejected(&err);
            Err(err.into())
        }
    }
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<Session> {
    Json(state.session.read().await.clone())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectPathRequest {
    pub path: String,
}

async fn select_path(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectPathRequest>,
) -> Result<Json<Session>, ApiError> {
    let path = match req.path.parse::<SetupPath>() {
        Ok(path) => path,
        Err(err) => {
            state.metrics.inc_workflow_errors(&err);
            return Err(err.into());
        }
    };
    transition(&state, SessionAction::SelectPath { path }).await
}

async fn back(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::Back).await
}

async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::Reset).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickRequest {
    pub adjustment_pct: i32,
}

async fn quick_adjust(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuickRequest>,
) -> Result<Json<Session>, ApiError> {
    transition(
        &state,
        SessionAction::SetAdjustment {
            adjustment_pct: req.adjustment_pct,
        },
    )
    .await
}

async fn quick_apply(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::ApplyQuick).await
}

async fn guided_update(
    State(state): State<Arc<AppState>>,
    Json(inputs): Json<GuidedInputsUpdate>,
) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::UpdateGuided { inputs }).await
}

async fn guided_next(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::GuidedNext).await
}

async fn guided_previous(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::GuidedPrevious).await
}

async fn guided_complete(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::CompleteGuided).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaRequest {
    pub formula: String,
}

async fn advanced_edit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FormulaRequest>,
) -> Result<Json<Session>, ApiError> {
    transition(
        &state,
        SessionAction::EditFormula {
            formula: req.formula,
        },
    )
    .await
}

async fn advanced_apply(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::ApplyAdvanced).await
}

async fn demo_complete_step(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::DemoCompleteStep).await
}

async fn demo_next(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::DemoNext).await
}

async fn demo_previous(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::DemoPrevious).await
}

/// Steps are numbered from 1
async fn demo_goto(
    State(state): State<Arc<AppState>>,
    Path(step): Path<usize>,
) -> Result<Json<Session>, ApiError> {
    let step = step
        .checked_sub(1)
        .and_then(DemoStep::from_index)
        .ok_or_else(|| ApiError::BadRequest(format!("demo step must be 1-4, got {}", step)))?;
    transition(&state, SessionAction::DemoGoto { step }).await
}

async fn demo_finish(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    transition(&state, SessionAction::FinishDemo).await
}

// FOCUS

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FocusQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl FocusQuery {
    fn period(&self) -> Result<BillingPeriod, ApiError> {
        match (self.year, self.month) {
            (None, None) => Ok(BillingPeriod::current()),
            (Some(year), Some(month)) => BillingPeriod::for_month(year, month)
                .ok_or_else(|| ApiError::BadRequest(format!("invalid month {}-{}", year, month))),
            _ => Err(ApiError::BadRequest(
                "year and month must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusResponse {
    pub billing_period: BillingPeriod,
    pub currency: String,
    pub records: Vec<FocusRecord>,
}

async fn focus(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FocusQuery>,
) -> Result<Json<FocusResponse>, ApiError> {
    let period = query.period()?;
    let (profile, currency) = {
        let session = state.session.read().await;
        (session.profile, session.currency.clone())
    };

    let records = enrich_with_costs(&state.inventory.vms, &profile, &period, &currency);
    state.logger.log_focus_export(records.len(), &currency);

    Ok(Json(FocusResponse {
        billing_period: period,
        currency,
        records,
    }))
}

async fn focus_line_items(State(state): State<Arc<AppState>>) -> Json<Vec<LineItem>> {
    let profile = state.session.read().await.profile;
    Json(lookup_line_items(&state.inventory.vms, &profile))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/inventory", get(inventory))
        .route("/api/v1/inventory/vms", get(inventory_vms))
        .route("/api/v1/inventory/hosts", get(inventory_hosts))
        .route("/api/v1/inventory/datastores", get(inventory_datastores))
        .route("/api/v1/profile", get(profile))
        .route("/api/v1/costs", get(costs))
        .route("/api/v1/costs/vms", get(vm_costs))
        .route("/api/v1/costs/advanced", post(advanced_costs))
        .route("/api/v1/optimizations", get(optimizations))
        .route("/api/v1/session", get(get_session))
        .route("/api/v1/session/path", post(select_path))
        .route("/api/v1/session/back", post(back))
        .route("/api/v1/session/reset", post(reset))
        .route("/api/v1/session/quick", post(quick_adjust))
        .route("/api/v1/session/quick/apply", post(quick_apply))
        .route("/api/v1/session/guided", post(guided_update))
        .route("/api/v1/session/guided/next", post(guided_next))
        .route("/api/v1/session/guided/previous", post(guided_previous))
        .route("/api/v1/session/guided/complete", post(guided_complete))
        .route("/api/v1/session/advanced", post(advanced_edit))
        .route("/api/v1/session/advanced/apply", post(advanced_apply))
        .route(
            "/api/v1/session/demo/complete-step",
            post(demo_complete_step),
        )
        .route("/api/v1/session/demo/next", post(demo_next))
        .route("/api/v1/session/demo/previous", post(demo_previous))
        .route("/api/v1/session/demo/goto/:step", post(demo_goto))
        .route("/api/v1/session/demo/finish", post(demo_finish))
        .route("/api/v1/focus", get(focus))
        .route("/api/v1/focus/line-items", get(focus_line_items))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
