//! Advanced setup
//!
//! The formula text is kept for display and editing only; it is never
//! evaluated. Applying always yields the fixed advanced-tier profile.

use serde::{Deserialize, Serialize};

use crate::models::CostProfile;

pub const DEFAULT_FORMULA: &str = r#"// Advanced Cost Formula Builder
// Define custom cost allocation logic

function calculateVMCost(vm) {
  let baseCost = 0;

  // Environment-based multipliers
  const envMultiplier = {
    'Production': 1.5,
    'Development': 0.7,
    'Test': 0.5
  };

  // Base resource costs
  baseCost += vm.vCPU * 50;
  baseCost += vm.memoryGB * 10;
  baseCost += vm.storageGB * 0.10;

  // Apply environment multiplier
  const multiplier = envMultiplier[vm.tags.environment] || 1.0;
  baseCost = baseCost * multiplier;

  // Department-specific overrides
  if (vm.tags.department === 'DataScience') {
    baseCost += 500;
  }

  // Powered off discount
  if (vm.powerState === 'poweredOff') {
    baseCost = baseCost * 0.2;
  }

  return baseCost;
}"#;

/// Profile produced by [`AdvancedSetup::apply`]
pub const ADVANCED_PROFILE: CostProfile = CostProfile {
    cpu_cost_per_core_month: 75.0,
    memory_cost_per_gb_month: 15.0,
    storage_cost_per_gb_month: 0.15,
    power_cooling_per_vm_month: 40.0,
    software_license_per_vm_month: 100.0,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSetup {
    pub formula: String,
}

impl Default for AdvancedSetup {
    fn default() -> Self {
        Self {
            formula: DEFAULT_FORMULA.to_string(),
        }
    }
}

impl AdvancedSetup {
    pub fn with_formula(self, formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
        }
    }

    pub fn apply(&self) -> CostProfile {
        ADVANCED_PROFILE
    }
}
