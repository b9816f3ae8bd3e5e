//! End-to-end demo flow: connect, build a profile, enrich, analyze
//!
//! Each step has to be completed before the flow can advance past it. Going
//! back and jumping to an earlier step are always allowed.

use serde::{Deserialize, Serialize};

use super::guided::{
    derive_hardware_rates, derive_license_rate, derive_opex_rate, FleetCapacity, GuidedInputs,
};
use crate::cost::calculate_total_costs;
use crate::error::WorkflowError;
use crate::focus::{enrich_with_costs, BillingPeriod, FocusRecord};
use crate::inventory::{Inventory, InventorySummary};
use crate::models::CostProfile;
use crate::optimize::{identify_optimization_opportunities, OptimizationSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DemoStep {
    Connect,
    BuildProfile,
    Enrich,
    Analyze,
}

impl DemoStep {
    pub const ALL: [DemoStep; 4] = [
        DemoStep::Connect,
        DemoStep::BuildProfile,
        DemoStep::Enrich,
        DemoStep::Analyze,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            DemoStep::Connect => "Connect Infrastructure",
            DemoStep::BuildProfile => "Build Cost Profile",
            DemoStep::Enrich => "Enrich & Map",
            DemoStep::Analyze => "Analyze & Optimize",
        }
    }
}

/// Fixed inputs the demo profile is built from
pub fn demo_inputs() -> GuidedInputs {
    GuidedInputs {
        total_hardware_investment: 125_000.0,
        depreciation_years: 5,
        residual_value_pct: 0.0,
        power_cooling_monthly: 5000.0,
        facilities_monthly: 3000.0,
        network_bandwidth_monthly: 0.0,
        staff_allocation_monthly: 0.0,
        vmware_license_annual: 3000.0,
        windows_license_monthly: 100.0,
        sql_license_monthly: 0.0,
    }
}

/// Demo profile for a fleet, using the guided-setup arithmetic
pub fn demo_profile(inventory: &Inventory) -> CostProfile {
    let inputs = demo_inputs();
    let fleet = FleetCapacity::of(inventory);
    let profile = derive_hardware_rates(CostProfile::zero(), &inputs, &fleet);
    let profile = derive_opex_rate(profile, &inputs, &fleet);
    derive_license_rate(profile, &inputs, &fleet)
}

/// What each completed step produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoResults {
    pub connected: Option<InventorySummary>,
    pub profile: Option<CostProfile>,
    pub monthly_total: Option<f64>,
    pub records: Option<Vec<FocusRecord>>,
    pub optimizations: Option<OptimizationSummary>,
    pub export_generated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoFlow {
    pub current: DemoStep,
    pub completed: [bool; 4],
    pub results: DemoResults,
}

impl Default for DemoFlow {
    fn default() -> Self {
        Self {
            current: DemoStep::Connect,
            completed: [false; 4],
            results: DemoResults::default(),
        }
    }
}

impl DemoFlow {
    pub fn is_complete(&self, step: DemoStep) -> bool {
        self.completed[step.index()]
    }

    /// Complete the current step
    pub fn complete_step(self, inventory: &Inventory, currency: &str) -> Self {
        let mut completed = self.completed;
        completed[self.current.index()] = true;
        let mut results = self.results;

        match self.current {
            DemoStep::Connect => {
                results.connected = Some(inventory.summary());
            }
            DemoStep::BuildProfile => {
                let profile = demo_profile(inventory);
                results.monthly_total =
                    Some(calculate_total_costs(&inventory.vms, &profile).total_monthly);
                results.profile = Some(profile);
            }
            DemoStep::Enrich => {
                let profile = results.profile.unwrap_or_else(|| demo_profile(inventory));
                results.records = Some(enrich_with_costs(
                    &inventory.vms,
                    &profile,
                    &BillingPeriod::current(),
                    currency,
                ));
            }
            DemoStep::Analyze => {
                results.optimizations =
                    Some(identify_optimization_opportunities(&inventory.vms).to_summary());
                results.export_generated = true;
            }
        }

        Self {
            current: self.current,
            completed,
            results,
        }
    }

    pub fn next(self) -> Result<Self, WorkflowError> {
        if !self.is_complete(self.current) {
            return Err(WorkflowError::StepIncomplete {
                step: self.current.title(),
            });
        }
        let next = DemoStep::from_index(self.current.index() + 1)
            .ok_or_else(|| WorkflowError::invalid("demo:analyze", "next"))?;
        Ok(Self {
            current: next,
            ..self
        })
    }

    pub fn previous(self) -> Result<Self, WorkflowError> {
        let index = self
            .current
            .index()
            .checked_sub(1)
            .ok_or_else(|| WorkflowError::invalid("demo:connect", "previous"))?;
        Ok(Self {
            current: DemoStep::ALL[index],
            ..self
        })
    }

    /// Jump to a step at or before the current one
    pub fn goto(self, step: DemoStep) -> Result<Self, WorkflowError> {
        if step > self.current {
            return Err(WorkflowError::invalid("demo", "goto"));
        }
        Ok(Self {
            current: step,
            ..self
        })
    }

    /// The demo profile, once the build step has run
    pub fn profile(&self) -> Option<CostProfile> {
        self.results.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn through_all_steps(inventory: &Inventory) -> DemoFlow {
        let mut flow = DemoFlow::default();
        for _ in 0..3 {
            flow = flow.complete_step(inventory, "USD").next().unwrap();
        }
        flow.complete_step(inventory, "USD")
    }

    #[test]
    fn test_next_requires_completion() {
        let flow = DemoFlow::default();
        assert_eq!(
            flow.next(),
            Err(WorkflowError::StepIncomplete {
                step: "Connect Infrastructure"
            })
        );
    }

    #[test]
    fn test_connect_records_inventory() {
        let inventory = Inventory::sample();
        let flow = DemoFlow::default().complete_step(&inventory, "USD");
        assert!(flow.is_complete(DemoStep::Connect));
        assert_eq!(flow.results.connected.map(|s| s.vm_count), Some(20));

        let flow = flow.next().unwrap();
        assert_eq!(flow.current, DemoStep::BuildProfile);
    }

    #[test]
    fn test_demo_profile_rates() {
        let profile = demo_profile(&Inventory::sample());
        let monthly = 125_000.0 / 60.0;

        assert!(approx(profile.cpu_cost_per_core_month, monthly * 0.4 / 240.0));
        // (5000 + 3000) / 20
        assert!(approx(profile.power_cooling_per_vm_month, 400.0));
        // (250 + 100) / 20
        assert!(approx(profile.software_license_per_vm_month, 17.5));
    }

    #[test]
    fn test_full_run() {
        let inventory = Inventory::sample();
        let flow = through_all_steps(&inventory);

        assert_eq!(flow.current, DemoStep::Analyze);
        assert!(flow.completed.iter().all(|done| *done));
        assert!(flow.results.monthly_total.unwrap() > 0.0);
        assert_eq!(flow.results.records.as_ref().map(Vec::len), Some(20));
        assert_eq!(
            flow.results.optimizations.as_ref().map(|o| o.total_savings_opportunity),
            Some(3400.0)
        );
        assert!(flow.results.export_generated);
        assert!(flow.clone().next().is_err());
    }

    #[test]
    fn test_goto_only_backwards() {
        let inventory = Inventory::sample();
        let flow = DemoFlow::default()
            .complete_step(&inventory, "USD")
            .next()
            .unwrap();

        assert!(flow.clone().goto(DemoStep::Enrich).is_err());
        let back = flow.goto(DemoStep::Connect).unwrap();
        assert_eq!(back.current, DemoStep::Connect);
        // completion survives the jump
        assert!(back.next().is_ok());
    }

    #[test]
    fn test_previous_at_first_step_fails() {
        assert!(DemoFlow::default().previous().is_err());
    }
}
