//! Guided setup: four-step derivation of a cost profile
//!
//! 1. Hardware costs: depreciation split 40/40/20 across CPU, memory, storage
//! 2. Operating expenses: spread evenly per VM
//! 3. Software licensing: spread evenly per VM
//! 4. Review
//!
//! Advancing commits the current step's rates into the profile. Going back
//! keeps everything already derived.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::inventory::Inventory;
use crate::models::CostProfile;

/// Share of monthly hardware cost attributed to CPU
pub const CPU_HARDWARE_SHARE: f64 = 0.4;
/// Share of monthly hardware cost attributed to memory
pub const MEMORY_HARDWARE_SHARE: f64 = 0.4;
/// Share of monthly hardware cost attributed to storage
pub const STORAGE_HARDWARE_SHARE: f64 = 0.2;
/// Assumed total storage capacity in GB (50 TB)
pub const ASSUMED_STORAGE_CAPACITY_GB: f64 = 50_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GuidedStep {
    HardwareCosts,
    OperatingExpenses,
    SoftwareLicensing,
    Review,
}

impl GuidedStep {
    pub fn number(&self) -> u8 {
        match self {
            GuidedStep::HardwareCosts => 1,
            GuidedStep::OperatingExpenses => 2,
            GuidedStep::SoftwareLicensing => 3,
            GuidedStep::Review => 4,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GuidedStep::HardwareCosts => "Hardware Costs",
            GuidedStep::OperatingExpenses => "Operating Expenses",
            GuidedStep::SoftwareLicensing => "Software Licensing",
            GuidedStep::Review => "Review & Validate",
        }
    }

    fn next(&self) -> Option<Self> {
        match self {
            GuidedStep::HardwareCosts => Some(GuidedStep::OperatingExpenses),
            GuidedStep::OperatingExpenses => Some(GuidedStep::SoftwareLicensing),
            GuidedStep::SoftwareLicensing => Some(GuidedStep::Review),
            GuidedStep::Review => None,
        }
    }

    fn previous(&self) -> Option<Self> {
        match self {
            GuidedStep::HardwareCosts => None,
            GuidedStep::OperatingExpenses => Some(GuidedStep::HardwareCosts),
            GuidedStep::SoftwareLicensing => Some(GuidedStep::OperatingExpenses),
            GuidedStep::Review => Some(GuidedStep::SoftwareLicensing),
        }
    }
}

/// User-entered figures for all steps. Every field is optional on update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedInputs {
    pub total_hardware_investment: f64,
    pub depreciation_years: u32,
    /// Fraction of the investment recovered at end of life, 0.0..=1.0
    pub residual_value_pct: f64,

    pub power_cooling_monthly: f64,
    pub facilities_monthly: f64,
    pub network_bandwidth_monthly: f64,
    pub staff_allocation_monthly: f64,

    pub vmware_license_annual: f64,
    pub windows_license_monthly: f64,
    pub sql_license_monthly: f64,
}

impl GuidedInputs {
    pub fn for_inventory(inventory: &Inventory) -> Self {
        Self {
            total_hardware_investment: inventory.total_hardware_investment(),
            depreciation_years: 5,
            residual_value_pct: 0.0,
            power_cooling_monthly: 5000.0,
            facilities_monthly: 3000.0,
            network_bandwidth_monthly: 2000.0,
            staff_allocation_monthly: 25000.0,
            vmware_license_annual: 3000.0,
            windows_license_monthly: 100.0,
            sql_license_monthly: 0.0,
        }
    }

    pub fn merged_with(&self, update: &GuidedInputsUpdate) -> Self {
        Self {
            total_hardware_investment: update
                .total_hardware_investment
                .unwrap_or(self.total_hardware_investment),
            depreciation_years: update.depreciation_years.unwrap_or(self.depreciation_years),
            residual_value_pct: update.residual_value_pct.unwrap_or(self.residual_value_pct),
            power_cooling_monthly: update
                .power_cooling_monthly
                .unwrap_or(self.power_cooling_monthly),
            facilities_monthly: update.facilities_monthly.unwrap_or(self.facilities_monthly),
            network_bandwidth_monthly: update
                .network_bandwidth_monthly
                .unwrap_or(self.network_bandwidth_monthly),
            staff_allocation_monthly: update
                .staff_allocation_monthly
                .unwrap_or(self.staff_allocation_monthly),
            vmware_license_annual: update
                .vmware_license_annual
                .unwrap_or(self.vmware_license_annual),
            windows_license_monthly: update
                .windows_license_monthly
                .unwrap_or(self.windows_license_monthly),
            sql_license_monthly: update.sql_license_monthly.unwrap_or(self.sql_license_monthly),
        }
    }

    /// Monthly hardware cost after depreciation
    pub fn monthly_hardware_cost(&self) -> f64 {
        self.total_hardware_investment * (1.0 - self.residual_value_pct)
            / (self.depreciation_years as f64 * 12.0)
    }

    pub fn total_monthly_opex(&self) -> f64 {
        self.power_cooling_monthly
            + self.facilities_monthly
            + self.network_bandwidth_monthly
            + self.staff_allocation_monthly
    }

    pub fn total_monthly_software(&self) -> f64 {
        self.vmware_license_annual / 12.0 + self.windows_license_monthly + self.sql_license_monthly
    }
}

/// Partial update of [`GuidedInputs`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedInputsUpdate {
    pub total_hardware_investment: Option<f64>,
    pub depreciation_years: Option<u32>,
    pub residual_value_pct: Option<f64>,
    pub power_cooling_monthly: Option<f64>,
    pub facilities_monthly: Option<f64>,
    pub network_bandwidth_monthly: Option<f64>,
    pub staff_allocation_monthly: Option<f64>,
    pub vmware_license_annual: Option<f64>,
    pub windows_license_monthly: Option<f64>,
    pub sql_license_monthly: Option<f64>,
}

/// Fleet figures the derivations divide by
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetCapacity {
    pub vm_count: usize,
    pub total_host_cores: u64,
    #[serde(rename = "totalHostMemoryGB")]
    pub total_host_memory_gb: f64,
}

impl FleetCapacity {
    pub fn of(inventory: &Inventory) -> Self {
        Self {
            vm_count: inventory.vms.len(),
            total_host_cores: inventory.total_host_cores(),
            total_host_memory_gb: inventory.total_host_memory_gb(),
        }
    }
}

/// Step 1: CPU, memory and storage rates from hardware depreciation
pub fn derive_hardware_rates(
    profile: CostProfile,
    inputs: &GuidedInputs,
    fleet: &FleetCapacity,
) -> CostProfile {
    let monthly = inputs.monthly_hardware_cost();
    CostProfile {
        cpu_cost_per_core_month: monthly * CPU_HARDWARE_SHARE / fleet.total_host_cores as f64,
        memory_cost_per_gb_month: monthly * MEMORY_HARDWARE_SHARE / fleet.total_host_memory_gb,
        storage_cost_per_gb_month: monthly * STORAGE_HARDWARE_SHARE / ASSUMED_STORAGE_CAPACITY_GB,
        ..profile
    }
}

/// Step 2: operating expenses per VM
pub fn derive_opex_rate(
    profile: CostProfile,
    inputs: &GuidedInputs,
    fleet: &FleetCapacity,
) -> CostProfile {
    CostProfile {
        power_cooling_per_vm_month: inputs.total_monthly_opex() / fleet.vm_count as f64,
        ..profile
    }
}

/// Step 3: software licensing per VM
pub fn derive_license_rate(
    profile: CostProfile,
    inputs: &GuidedInputs,
    fleet: &FleetCapacity,
) -> CostProfile {
    CostProfile {
        software_license_per_vm_month: inputs.total_monthly_software() / fleet.vm_count as f64,
        ..profile
    }
}

/// Guided setup state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedSetup {
    pub step: GuidedStep,
    pub inputs: GuidedInputs,
    pub fleet: FleetCapacity,
    /// Rates committed so far; all zero until the first step is committed
    pub profile: CostProfile,
}

impl GuidedSetup {
    pub fn new(inventory: &Inventory) -> Self {
        Self {
            step: GuidedStep::HardwareCosts,
            inputs: GuidedInputs::for_inventory(inventory),
            fleet: FleetCapacity::of(inventory),
            profile: CostProfile::zero(),
        }
    }

    pub fn with_inputs(self, update: &GuidedInputsUpdate) -> Self {
        Self {
            inputs: self.inputs.merged_with(update),
            ..self
        }
    }

    /// Commit the current step's derivation and move to the next step
    pub fn next(self) -> Result<Self, WorkflowError> {
        let next = self
            .step
            .next()
            .ok_or_else(|| WorkflowError::invalid("guided:review", "next"))?;

        let profile = match self.step {
            GuidedStep::HardwareCosts => derive_hardware_rates(self.profile, &self.inputs, &self.fleet),
            GuidedStep::OperatingExpenses => derive_opex_rate(self.profile, &self.inputs, &self.fleet),
            GuidedStep::SoftwareLicensing => {
                derive_license_rate(self.profile, &self.inputs, &self.fleet)
            }
            GuidedStep::Review => self.profile,
        };

        Ok(Self {
            step: next,
            profile,
            ..self
        })
    }

    /// Step back without discarding derived rates
    pub fn previous(self) -> Result<Self, WorkflowError> {
        let previous = self
            .step
            .previous()
            .ok_or_else(|| WorkflowError::invalid("guided:hardware", "previous"))?;
        Ok(Self {
            step: previous,
            ..self
        })
    }

    /// The derived profile; only available on the review step
    pub fn complete(&self) -> Result<CostProfile, WorkflowError> {
        if self.step != GuidedStep::Review {
            return Err(WorkflowError::StepIncomplete {
                step: self.step.title(),
            });
        }
        Ok(self.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn run_to_review(setup: GuidedSetup) -> GuidedSetup {
        setup.next().unwrap().next().unwrap().next().unwrap()
    }

    #[test]
    fn test_default_inputs_from_sample() {
        let setup = GuidedSetup::new(&Inventory::sample());
        assert_eq!(setup.step, GuidedStep::HardwareCosts);
        assert_eq!(setup.inputs.total_hardware_investment, 125000.0);
        assert_eq!(setup.profile, CostProfile::zero());
        assert_eq!(setup.fleet.vm_count, 20);
    }

    #[test]
    fn test_hardware_step_rates() {
        let setup = GuidedSetup::new(&Inventory::sample()).next().unwrap();
        // 125000 / 60 months
        let monthly = 125000.0 / 60.0;

        assert_eq!(setup.step, GuidedStep::OperatingExpenses);
        assert!(approx(setup.profile.cpu_cost_per_core_month, monthly * 0.4 / 240.0));
        assert!(approx(setup.profile.memory_cost_per_gb_month, monthly * 0.4 / 1920.0));
        assert!(approx(setup.profile.storage_cost_per_gb_month, monthly * 0.2 / 50000.0));
        assert_eq!(setup.profile.power_cooling_per_vm_month, 0.0);
    }

    #[test]
    fn test_residual_value_reduces_hardware_cost() {
        let update = GuidedInputsUpdate {
            total_hardware_investment: Some(120000.0),
            depreciation_years: Some(4),
            residual_value_pct: Some(0.2),
            ..Default::default()
        };
        let setup = GuidedSetup::new(&Inventory::sample()).with_inputs(&update);
        // 120000 * 0.8 / 48
        assert!(approx(setup.inputs.monthly_hardware_cost(), 2000.0));
    }

    #[test]
    fn test_full_run_derives_all_rates() {
        let setup = run_to_review(GuidedSetup::new(&Inventory::sample()));
        let profile = setup.complete().unwrap();

        // (5000 + 3000 + 2000 + 25000) / 20
        assert!(approx(profile.power_cooling_per_vm_month, 1750.0));
        // (3000 / 12 + 100 + 0) / 20
        assert!(approx(profile.software_license_per_vm_month, 17.5));
        assert!(profile.cpu_cost_per_core_month > 0.0);
    }

    #[test]
    fn test_complete_before_review_fails() {
        let setup = GuidedSetup::new(&Inventory::sample()).next().unwrap();
        assert_eq!(
            setup.complete(),
            Err(WorkflowError::StepIncomplete {
                step: "Operating Expenses"
            })
        );
    }

    #[test]
    fn test_previous_keeps_derived_rates() {
        let at_review = run_to_review(GuidedSetup::new(&Inventory::sample()));
        let derived = at_review.profile;

        let back = at_review.previous().unwrap().previous().unwrap();
        assert_eq!(back.step, GuidedStep::OperatingExpenses);
        assert_eq!(back.profile, derived);
    }

    #[test]
    fn test_recommit_after_going_back() {
        let at_review = run_to_review(GuidedSetup::new(&Inventory::sample()));
        let update = GuidedInputsUpdate {
            staff_allocation_monthly: Some(0.0),
            ..Default::default()
        };

        let redone = at_review
            .previous()
            .unwrap()
            .previous()
            .unwrap()
            .with_inputs(&update)
            .next()
            .unwrap();

        assert_eq!(redone.step, GuidedStep::SoftwareLicensing);
        assert!(approx(redone.profile.power_cooling_per_vm_month, 500.0));
        // licensing committed earlier is still there
        assert!(approx(redone.profile.software_license_per_vm_month, 17.5));
    }

    #[test]
    fn test_no_step_past_the_ends() {
        let setup = GuidedSetup::new(&Inventory::sample());
        assert!(setup.clone().previous().is_err());
        assert!(run_to_review(setup).next().is_err());
    }

    #[test]
    fn test_empty_fleet_yields_non_finite_rates() {
        let setup = GuidedSetup::new(&Inventory::default());
        let profile = run_to_review(setup).complete().unwrap();
        assert!(!profile.power_cooling_per_vm_month.is_finite());
        assert!(!profile.software_license_per_vm_month.is_finite());
    }
}
