//! Optimization heuristics
//!
//! Flags VMs that look oversized, idle ("zombie"), powered off or missing
//! allocation tags, and estimates a flat monthly savings figure.
//!
//! Buckets are not mutually exclusive: every zombie is also oversized, and
//! the savings estimate counts it in both.

use serde::Serialize;

use crate::models::VirtualMachine;

/// CPU utilization (%) below which a powered-on VM is oversized
pub const OVERSIZED_CPU_THRESHOLD: f64 = 20.0;
/// Memory utilization (%) below which a powered-on VM is oversized
pub const OVERSIZED_MEMORY_THRESHOLD: f64 = 30.0;
/// CPU utilization (%) below which a powered-on VM may be a zombie
pub const ZOMBIE_CPU_THRESHOLD: f64 = 5.0;
/// Memory utilization (%) below which a powered-on VM may be a zombie
pub const ZOMBIE_MEMORY_THRESHOLD: f64 = 15.0;

/// Estimated monthly savings per oversized VM
pub const OVERSIZED_SAVINGS: f64 = 500.0;
/// Estimated monthly savings per zombie VM
pub const ZOMBIE_SAVINGS: f64 = 300.0;
/// Estimated monthly savings per powered-off VM
pub const POWERED_OFF_SAVINGS: f64 = 100.0;

/// Result of an optimization scan. Buckets borrow the scanned records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport<'a> {
    pub oversized: Vec<&'a VirtualMachine>,
    pub zombies: Vec<&'a VirtualMachine>,
    pub powered_off: Vec<&'a VirtualMachine>,
    pub missing_tags: Vec<&'a VirtualMachine>,
    pub total_savings_opportunity: f64,
}

fn is_oversized(vm: &VirtualMachine) -> bool {
    vm.is_powered_on()
        && (vm.cpu_usage_avg < OVERSIZED_CPU_THRESHOLD
            || vm.memory_usage_avg < OVERSIZED_MEMORY_THRESHOLD)
}

fn is_zombie(vm: &VirtualMachine) -> bool {
    vm.is_powered_on()
        && vm.cpu_usage_avg < ZOMBIE_CPU_THRESHOLD
        && vm.memory_usage_avg < ZOMBIE_MEMORY_THRESHOLD
}

/// Owner is not an allocation tag and is not checked
fn is_missing_tags(vm: &VirtualMachine) -> bool {
    vm.tags.department.is_none() || vm.tags.environment.is_none() || vm.tags.application.is_none()
}

/// Scan a fleet for optimization opportunities
pub fn identify_optimization_opportunities(vms: &[VirtualMachine]) -> OptimizationReport<'_> {
    let oversized: Vec<_> = vms.iter().filter(|vm| is_oversized(vm)).collect();
    let zombies: Vec<_> = vms.iter().filter(|vm| is_zombie(vm)).collect();
    let powered_off: Vec<_> = vms.iter().filter(|vm| vm.is_powered_off()).collect();
    let missing_tags: Vec<_> = vms.iter().filter(|vm| is_missing_tags(vm)).collect();

    let total_savings_opportunity = oversized.len() as f64 * OVERSIZED_SAVINGS
        + zombies.len() as f64 * ZOMBIE_SAVINGS
        + powered_off.len() as f64 * POWERED_OFF_SAVINGS;

    OptimizationReport {
        oversized,
        zombies,
        powered_off,
        missing_tags,
        total_savings_opportunity,
    }
}

impl OptimizationReport<'_> {
    /// Savings as a rounded percentage of the monthly total.
    /// A zero total yields a non-finite value.
    pub fn savings_percent_of(&self, total_monthly: f64) -> f64 {
        (self.total_savings_opportunity / total_monthly * 100.0).round()
    }

    /// Share of VMs missing allocation tags, as a rounded percentage
    pub fn missing_tag_percent(&self, vm_count: usize) -> f64 {
        (self.missing_tags.len() as f64 / vm_count as f64 * 100.0).round()
    }

    /// Owned, id-only view for transport
    pub fn to_summary(&self) -> OptimizationSummary {
        fn ids(bucket: &[&VirtualMachine]) -> Vec<String> {
            bucket.iter().map(|vm| vm.id.clone()).collect()
        }

        OptimizationSummary {
            oversized: ids(&self.oversized),
            zombies: ids(&self.zombies),
            powered_off: ids(&self.powered_off),
            missing_tags: ids(&self.missing_tags),
            total_savings_opportunity: self.total_savings_opportunity,
        }
    }
}

/// VM ids per bucket
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSummary {
    pub oversized: Vec<String>,
    pub zombies: Vec<String>,
    pub powered_off: Vec<String>,
    pub missing_tags: Vec<String>,
    pub total_savings_opportunity: f64,
}
