//! Observability for the cost service
//!
//! Provides:
//! - Prometheus metrics (calculation latency, fleet size, cost and savings totals, workflow activity)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge, register_histogram, register_int_counter_vec, register_int_gauge, Gauge,
    Histogram, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::cost::CostSummary;
use crate::error::WorkflowError;
use crate::optimize::OptimizationReport;
use crate::workflow::SetupPath;

/// Latency buckets in seconds
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5,
];

static GLOBAL_METRICS: OnceLock<CostMetricsInner> = OnceLock::new();

struct CostMetricsInner {
    calculation_latency_seconds: Histogram,
    inventory_vms: IntGauge,
    total_monthly_cost: Gauge,
    savings_opportunity: Gauge,
    profiles_applied: IntCounterVec,
    workflow_errors: IntCounterVec,
}

impl CostMetricsInner {
    fn new() -> Self {
        Self {
            calculation_latency_seconds: register_histogram!(
                "vmcost_calculation_latency_seconds",
                "Time spent computing fleet cost summaries",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register calculation_latency_seconds"),

            inventory_vms: register_int_gauge!(
                "vmcost_inventory_vms",
                "Number of VMs in the loaded inventory"
            )
            .expect("Failed to register inventory_vms"),

            total_monthly_cost: register_gauge!(
                "vmcost_total_monthly_cost",
                "Fleet monthly cost under the active profile"
            )
            .expect("Failed to register total_monthly_cost"),

            savings_opportunity: register_gauge!(
                "vmcost_savings_opportunity_monthly",
                "Estimated monthly savings from the last optimization scan"
            )
            .expect("Failed to register savings_opportunity"),

            profiles_applied: register_int_counter_vec!(
                "vmcost_profiles_applied_total",
                "Cost profiles applied, by setup path",
                &["path"]
            )
            .expect("Failed to register profiles_applied"),

            workflow_errors: register_int_counter_vec!(
                "vmcost_workflow_errors_total",
                "Rejected workflow actions, by error kind",
                &["kind"]
            )
            .expect("Failed to register workflow_errors"),
        }
    }
}

/// Handle to the process-wide cost metrics. Clones share the same metrics.
#[derive(Clone)]
pub struct CostMetrics {
    _private: (),
}

impl Default for CostMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CostMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(CostMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &CostMetricsInner {
        GLOBAL_METRICS.get_or_init(CostMetricsInner::new)
    }

    pub fn observe_calculation_latency(&self, duration_secs: f64) {
        self.inner().calculation_latency_seconds.observe(duration_secs);
    }

    pub fn set_inventory_vms(&self, count: usize) {
        self.inner().inventory_vms.set(count as i64);
    }

    pub fn set_total_monthly_cost(&self, total: f64) {
        self.inner().total_monthly_cost.set(total);
    }

    pub fn set_savings_opportunity(&self, savings: f64) {
        self.inner().savings_opportunity.set(savings);
    }

    pub fn inc_profiles_applied(&self, path: SetupPath) {
        self.inner()
            .profiles_applied
            .with_label_values(&[path.as_str()])
            .inc();
    }

    pub fn inc_workflow_errors(&self, error: &WorkflowError) {
        let kind = match error {
            WorkflowError::InvalidTransition { .. } => "invalid_transition",
            WorkflowError::AdjustmentOutOfRange { .. } => "out_of_range",
            WorkflowError::StepIncomplete { .. } => "step_incomplete",
            WorkflowError::UnknownPath(_) => "unknown_path",
        };
        self.inner().workflow_errors.with_label_values(&[kind]).inc();
    }
}

/// Structured logger for cost service events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            port = port,
            "Cost service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Cost service shutting down"
        );
    }

    pub fn log_inventory_loaded(&self, source: &str, vms: usize, hosts: usize, datastores: usize) {
        info!(
            event = "inventory_loaded",
            instance = %self.instance,
            source = %source,
            vms = vms,
            hosts = hosts,
            datastores = datastores,
            "Inventory loaded"
        );
    }

    pub fn log_path_selected(&self, path: SetupPath) {
        info!(
            event = "setup_path_selected",
            instance = %self.instance,
            path = %path,
            "Setup path selected"
        );
    }

    pub fn log_profile_applied(&self, path: SetupPath, cpu_cost_per_core_month: f64) {
        info!(
            event = "profile_applied",
            instance = %self.instance,
            path = %path,
            cpu_cost_per_core_month = cpu_cost_per_core_month,
            "Cost profile applied"
        );
    }

    pub fn log_workflow_rejected(&self, error: &WorkflowError) {
        warn!(
            event = "workflow_rejected",
            instance = %self.instance,
            error = %error,
            "Workflow action rejected"
        );
    }

    pub fn log_cost_summary(&self, summary: &CostSummary, vm_count: usize) {
        if summary.total_monthly.is_finite() {
            info!(
                event = "cost_summary",
                instance = %self.instance,
                vms = vm_count,
                total_monthly = summary.total_monthly,
                total_daily = summary.total_daily,
                departments = summary.by_department.len(),
                "Cost summary computed"
            );
        } else {
            warn!(
                event = "cost_summary",
                instance = %self.instance,
                vms = vm_count,
                total_monthly = %summary.total_monthly,
                "Cost summary is not finite; check the active profile"
            );
        }
    }

    pub fn log_optimization_scan(&self, report: &OptimizationReport<'_>) {
        info!(
            event = "optimization_scan",
            instance = %self.instance,
            oversized = report.oversized.len(),
            zombies = report.zombies.len(),
            powered_off = report.powered_off.len(),
            missing_tags = report.missing_tags.len(),
            savings = report.total_savings_opportunity,
            "Optimization scan completed"
        );
    }

    pub fn log_focus_export(&self, records: usize, currency: &str) {
        info!(
            event = "focus_export",
            instance = %self.instance,
            records = records,
            currency = %currency,
            "FOCUS records generated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::calculate_total_costs;
    use crate::inventory::Inventory;
    use crate::models::CostProfile;
    use crate::optimize::identify_optimization_opportunities;

    #[test]
    fn test_cost_metrics_recording() {
        let metrics = CostMetrics::new();
        metrics.observe_calculation_latency(0.0001);
        metrics.set_inventory_vms(20);
        metrics.set_total_monthly_cost(12345.0);
        metrics.set_savings_opportunity(3400.0);
        metrics.inc_profiles_applied(SetupPath::Quick);
        metrics.inc_workflow_errors(&WorkflowError::invalid("quick", "next"));

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "vmcost_profiles_applied_total"));
        assert!(families.iter().any(|f| f.get_name() == "vmcost_inventory_vms"));
    }

    #[test]
    fn test_structured_logger_events() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");

        let inventory = Inventory::sample();
        let summary = calculate_total_costs(&inventory.vms, &CostProfile::default());
        logger.log_cost_summary(&summary, inventory.vms.len());
        logger.log_optimization_scan(&identify_optimization_opportunities(&inventory.vms));
        logger.log_path_selected(SetupPath::Demo);
    }
}
