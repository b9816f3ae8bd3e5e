//! Cost model
//!
//! Pure functions mapping a VM and a [`CostProfile`] to a monthly figure, and
//! reducing a VM collection into totals and group-by breakdowns.
//!
//! Arithmetic is unchecked. Negative rates, empty fleets and non-finite
//! results are returned as computed.

mod advanced;

pub use advanced::{calculate_advanced_vm_cost, ADVANCED_FLEET_DIVISOR};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::{CostProfile, PowerState, VirtualMachine};

/// Fixed month length used to derive daily figures
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Share of the license rate still charged for a powered-off VM
pub const POWERED_OFF_LICENSE_FACTOR: f64 = 0.5;

pub const UNALLOCATED_DEPARTMENT: &str = "Unallocated";
pub const UNTAGGED_ENVIRONMENT: &str = "Untagged";
pub const UNKNOWN_APPLICATION: &str = "Unknown";

/// Monthly cost of a single VM under the given profile
///
/// Powered-off machines keep paying for storage and half of the license
/// rate. Suspended machines are costed like powered-on ones.
pub fn calculate_vm_cost(vm: &VirtualMachine, profile: &CostProfile) -> f64 {
    if vm.power_state == PowerState::PoweredOff {
        return vm.storage_gb * profile.storage_cost_per_gb_month
            + profile.software_license_per_vm_month * POWERED_OFF_LICENSE_FACTOR;
    }

    let cpu = vm.vcpu as f64 * profile.cpu_cost_per_core_month;
    let memory = vm.memory_gb * profile.memory_cost_per_gb_month;
    let storage = vm.storage_gb * profile.storage_cost_per_gb_month;

    cpu + memory
        + storage
        + profile.power_cooling_per_vm_month
        + profile.software_license_per_vm_month
}

/// Grouping dimension for cost breakdowns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Department,
    Environment,
    Application,
}

impl GroupBy {
    /// Bucket key of a VM for this dimension
    pub fn key<'a>(&self, vm: &'a VirtualMachine) -> &'a str {
        match self {
            GroupBy::Department => vm
                .tags
                .department
                .as_deref()
                .unwrap_or(UNALLOCATED_DEPARTMENT),
            GroupBy::Environment => vm
                .tags
                .environment
                .as_deref()
                .unwrap_or(UNTAGGED_ENVIRONMENT),
            GroupBy::Application => vm
                .tags
                .application
                .as_deref()
                .unwrap_or(UNKNOWN_APPLICATION),
        }
    }
}

impl std::str::FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "department" => Ok(Self::Department),
            "environment" => Ok(Self::Environment),
            "application" => Ok(Self::Application),
            other => Err(format!("unknown grouping '{}'", other)),
        }
    }
}

/// Aggregate costs of a fleet
///
/// Breakdown keys are tag values discovered at runtime, kept in the order the
/// VMs were visited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub total_monthly: f64,
    pub total_daily: f64,
    pub by_department: IndexMap<String, f64>,
    pub by_environment: IndexMap<String, f64>,
    pub by_application: IndexMap<String, f64>,
}

impl CostSummary {
    pub fn breakdown(&self, group_by: GroupBy) -> &IndexMap<String, f64> {
        match group_by {
            GroupBy::Department => &self.by_department,
            GroupBy::Environment => &self.by_environment,
            GroupBy::Application => &self.by_application,
        }
    }
}

/// Total and grouped monthly costs of a fleet
pub fn calculate_total_costs(vms: &[VirtualMachine], profile: &CostProfile) -> CostSummary {
    let total_monthly: f64 = vms.iter().map(|vm| calculate_vm_cost(vm, profile)).sum();

    let mut by_department: IndexMap<String, f64> = IndexMap::new();
    let mut by_environment: IndexMap<String, f64> = IndexMap::new();
    let mut by_application: IndexMap<String, f64> = IndexMap::new();

    for vm in vms {
        let cost = calculate_vm_cost(vm, profile);
        for (map, group_by) in [
            (&mut by_department, GroupBy::Department),
            (&mut by_environment, GroupBy::Environment),
            (&mut by_application, GroupBy::Application),
        ] {
            *map.entry(group_by.key(vm).to_string()).or_insert(0.0) += cost;
        }
    }

    CostSummary {
        total_monthly,
        total_daily: total_monthly / DAYS_PER_MONTH,
        by_department,
        by_environment,
        by_application,
    }
}

/// One row of the per-VM cost table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmCost {
    pub id: String,
    pub name: String,
    #[serde(rename = "vCPU")]
    pub vcpu: u32,
    #[serde(rename = "memoryGB")]
    pub memory_gb: f64,
    #[serde(rename = "storageGB")]
    pub storage_gb: f64,
    pub power_state: PowerState,
    pub environment: Option<String>,
    pub department: Option<String>,
    pub monthly_cost: f64,
    pub daily_cost: f64,
}

/// Per-VM cost rows in inventory order
pub fn vm_cost_lines(vms: &[VirtualMachine], profile: &CostProfile) -> Vec<VmCost> {
    vms.iter()
        .map(|vm| {
            let monthly_cost = calculate_vm_cost(vm, profile);
            VmCost {
                id: vm.id.clone(),
                name: vm.name.clone(),
                vcpu: vm.vcpu,
                memory_gb: vm.memory_gb,
                storage_gb: vm.storage_gb,
                power_state: vm.power_state,
                environment: vm.tags.environment.clone(),
                department: vm.tags.department.clone(),
                monthly_cost,
                daily_cost: monthly_cost / DAYS_PER_MONTH,
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{PowerState, VirtualMachine, VmTags};
    use chrono::NaiveDate;

    pub fn vm(id: &str, vcpu: u32, memory_gb: f64, storage_gb: f64, state: PowerState) -> VirtualMachine {
        VirtualMachine {
            id: id.to_string(),
            name: id.to_uppercase(),
            vcpu,
            memory_gb,
            storage_gb,
            power_state: state,
            esxi_host: "esxi-test-01".to_string(),
            datastore: "SSD-Datastore-01".to_string(),
            tags: VmTags::default(),
            cpu_usage_avg: 50.0,
            memory_usage_avg: 50.0,
            created_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            last_powered_on: None,
        }
    }

    pub fn tagged(mut vm: VirtualMachine, env: Option<&str>, dept: Option<&str>, app: Option<&str>) -> VirtualMachine {
        vm.tags.environment = env.map(str::to_string);
        vm.tags.department = dept.map(str::to_string);
        vm.tags.application = app.map(str::to_string);
        vm
    }

    pub fn with_usage(mut vm: VirtualMachine, cpu: f64, mem: f64) -> VirtualMachine {
        vm.cpu_usage_avg = cpu;
        vm.memory_usage_avg = mem;
        vm
    }
}
