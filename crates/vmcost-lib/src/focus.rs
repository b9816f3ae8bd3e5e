//! FOCUS billing records
//!
//! Two ways of attaching costs to inventory resources:
//! - direct enrichment: one FOCUS record per VM with the billed cost and a
//!   per-component breakdown in extension columns
//! - lookup table: one line item per VM component with quantity and unit cost

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::cost::{calculate_vm_cost, UNALLOCATED_DEPARTMENT, UNTAGGED_ENVIRONMENT};
use crate::models::{CostProfile, VirtualMachine};

pub const RESOURCE_TYPE: &str = "Virtual Machine";
pub const SERVICE_NAME: &str = "VMware vSphere";
pub const SERVICE_CATEGORY: &str = "Compute";
pub const REGION: &str = "on-premises-dc1";

/// Calendar month a record is billed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BillingPeriod {
    /// Period covering the given month; `None` for an invalid month
    pub fn for_month(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        Some(Self {
            start: Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0)?),
            end: Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?),
        })
    }

    pub fn current() -> Self {
        let now = Utc::now();
        // The current month is always a valid date.
        Self::for_month(now.year(), now.month()).unwrap_or(Self {
            start: now,
            end: now,
        })
    }
}

/// One FOCUS row per VM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FocusRecord {
    pub resource_id: String,
    pub resource_name: String,
    pub resource_type: String,
    pub service_name: String,
    pub service_category: String,
    pub region: String,
    pub billed_cost: f64,
    pub billing_currency: String,
    pub billing_period_start: DateTime<Utc>,
    pub billing_period_end: DateTime<Utc>,
    pub charge_category: String,
    pub charge_class: String,
    pub charge_frequency: String,
    pub charge_type: String,

    #[serde(rename = "x_vCPU")]
    pub x_vcpu: u32,
    #[serde(rename = "x_MemoryGB")]
    pub x_memory_gb: f64,
    #[serde(rename = "x_StorageGB")]
    pub x_storage_gb: f64,
    #[serde(rename = "x_Environment")]
    pub x_environment: String,
    #[serde(rename = "x_Department")]
    pub x_department: String,
    #[serde(rename = "x_CPUCost")]
    pub x_cpu_cost: f64,
    #[serde(rename = "x_MemoryCost")]
    pub x_memory_cost: f64,
    #[serde(rename = "x_StorageCost")]
    pub x_storage_cost: f64,
    #[serde(rename = "x_OpExCost")]
    pub x_opex_cost: f64,
    #[serde(rename = "x_LicenseCost")]
    pub x_license_cost: f64,
}

/// Build a FOCUS record for every VM.
///
/// `BilledCost` follows the power-state rules of [`calculate_vm_cost`]; the
/// breakdown columns are the raw rate times quantity regardless of power
/// state, so they do not sum to the billed cost for powered-off VMs.
pub fn enrich_with_costs(
    vms: &[VirtualMachine],
    profile: &CostProfile,
    period: &BillingPeriod,
    currency: &str,
) -> Vec<FocusRecord> {
    vms.iter()
        .map(|vm| FocusRecord {
            resource_id: vm.id.clone(),
            resource_name: vm.name.clone(),
            resource_type: RESOURCE_TYPE.to_string(),
            service_name: SERVICE_NAME.to_string(),
            service_category: SERVICE_CATEGORY.to_string(),
            region: REGION.to_string(),
            billed_cost: calculate_vm_cost(vm, profile),
            billing_currency: currency.to_string(),
            billing_period_start: period.start,
            billing_period_end: period.end,
            charge_category: "Usage".to_string(),
            charge_class: "Consumed".to_string(),
            charge_frequency: "Usage-Based".to_string(),
            charge_type: "Usage".to_string(),
            x_vcpu: vm.vcpu,
            x_memory_gb: vm.memory_gb,
            x_storage_gb: vm.storage_gb,
            x_environment: vm
                .tags
                .environment
                .clone()
                .unwrap_or_else(|| UNTAGGED_ENVIRONMENT.to_string()),
            x_department: vm
                .tags
                .department
                .clone()
                .unwrap_or_else(|| UNALLOCATED_DEPARTMENT.to_string()),
            x_cpu_cost: vm.vcpu as f64 * profile.cpu_cost_per_core_month,
            x_memory_cost: vm.memory_gb * profile.memory_cost_per_gb_month,
            x_storage_cost: vm.storage_gb * profile.storage_cost_per_gb_month,
            x_opex_cost: profile.power_cooling_per_vm_month,
            x_license_cost: profile.software_license_per_vm_month,
        })
        .collect()
}

/// Component a lookup-table line item prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineItemKind {
    #[serde(rename = "vCPU")]
    Vcpu,
    #[serde(rename = "RAM")]
    Ram,
    Storage,
}

impl LineItemKind {
    fn suffix(&self) -> &'static str {
        match self {
            LineItemKind::Vcpu => "cpu",
            LineItemKind::Ram => "memory",
            LineItemKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for LineItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LineItemKind::Vcpu => "vCPU",
            LineItemKind::Ram => "RAM",
            LineItemKind::Storage => "Storage",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineItem {
    pub resource_id: String,
    pub resource_type: LineItemKind,
    pub quantity: f64,
    pub unit_cost: f64,
    pub total_cost: f64,
}

impl LineItem {
    fn new(vm: &VirtualMachine, kind: LineItemKind, quantity: f64, unit_cost: f64) -> Self {
        Self {
            resource_id: format!("{}-{}", vm.id, kind.suffix()),
            resource_type: kind,
            quantity,
            unit_cost,
            total_cost: quantity * unit_cost,
        }
    }
}

/// Three line items per VM: vCPU, RAM and storage
pub fn lookup_line_items(vms: &[VirtualMachine], profile: &CostProfile) -> Vec<LineItem> {
    vms.iter()
        .flat_map(|vm| {
            [
                LineItem::new(
                    vm,
                    LineItemKind::Vcpu,
                    vm.vcpu as f64,
                    profile.cpu_cost_per_core_month,
                ),
                LineItem::new(
                    vm,
                    LineItemKind::Ram,
                    vm.memory_gb,
                    profile.memory_cost_per_gb_month,
                ),
                LineItem::new(
                    vm,
                    LineItemKind::Storage,
                    vm.storage_gb,
                    profile.storage_cost_per_gb_month,
                ),
            ]
        })
        .collect()
}
