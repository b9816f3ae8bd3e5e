//! Cost library for on-premises virtualization infrastructure
//!
//! This crate provides the core functionality for:
//! - The VM, host and datastore inventory
//! - Cost profiles and per-VM / aggregate cost calculation
//! - Optimization heuristics (oversized, zombie, powered-off, untagged VMs)
//! - Setup workflows that derive a cost profile (quick, guided, advanced, demo)
//! - FOCUS-style billing record enrichment
//! - Health checks and observability

pub mod cost;
pub mod error;
pub mod focus;
pub mod health;
pub mod inventory;
pub mod models;
pub mod observability;
pub mod optimize;
pub mod workflow;

pub use cost::{
    calculate_advanced_vm_cost, calculate_total_costs, calculate_vm_cost, vm_cost_lines,
    CostSummary, GroupBy, VmCost,
};
pub use error::{InventoryError, WorkflowError};
pub use focus::{enrich_with_costs, lookup_line_items, BillingPeriod, FocusRecord, LineItem};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use inventory::Inventory;
pub use models::*;
pub use observability::{CostMetrics, StructuredLogger};
pub use optimize::{identify_optimization_opportunities, OptimizationReport, OptimizationSummary};
pub use workflow::{Session, SessionAction, SessionState, SetupPath};
