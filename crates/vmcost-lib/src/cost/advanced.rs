//! Advanced costing with environment multipliers, department overrides and
//! shared facilities/staff costs

use super::{calculate_vm_cost, UNTAGGED_ENVIRONMENT};
use crate::models::{AdvancedCostProfile, VirtualMachine};

/// Number of VMs the facilities and staff costs are spread over.
///
/// Fixed, independent of the actual fleet size.
pub const ADVANCED_FLEET_DIVISOR: f64 = 25.0;

/// Monthly cost of a VM under an advanced profile
///
/// The department override (if any) is merged over the base profile, the
/// base cost is scaled by the environment multiplier (1.0 when unmapped; an
/// explicit 0.0 is kept), and a flat share of facilities and staff costs is
/// added.
pub fn calculate_advanced_vm_cost(vm: &VirtualMachine, profile: &AdvancedCostProfile) -> f64 {
    let env = vm
        .tags
        .environment
        .as_deref()
        .unwrap_or(UNTAGGED_ENVIRONMENT);

    let rates = match vm
        .tags
        .department
        .as_deref()
        .and_then(|dept| profile.department_overrides.get(dept))
    {
        Some(over) => profile.base_profile.merged_with(over),
        None => profile.base_profile,
    };

    let multiplier = profile
        .environment_multipliers
        .get(env)
        .copied()
        .unwrap_or(1.0);

    let mut cost = calculate_vm_cost(vm, &rates) * multiplier;
    cost += profile.facilities_cost_per_month / ADVANCED_FLEET_DIVISOR;
    cost += profile.staff_cost_per_month / ADVANCED_FLEET_DIVISOR;
    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::test_support::{tagged, vm};
    use crate::models::{CostProfileOverride, PowerState};

    // (5000 + 25000) / 25
    const SHARED: f64 = 1200.0;

    #[test]
    fn test_production_multiplier() {
        let machine = tagged(
            vm("a", 4, 16.0, 100.0, PowerState::PoweredOn),
            Some("Production"),
            None,
            None,
        );
        let cost = calculate_advanced_vm_cost(&machine, &AdvancedCostProfile::default());
        assert!((cost - (425.0 * 1.5 + SHARED)).abs() < 1e-9);
    }

    #[test]
    fn test_unmapped_environment_uses_unit_multiplier() {
        let staging = tagged(
            vm("a", 4, 16.0, 100.0, PowerState::PoweredOn),
            Some("Staging"),
            None,
            None,
        );
        let untagged = vm("b", 4, 16.0, 100.0, PowerState::PoweredOn);
        let profile = AdvancedCostProfile::default();

        assert!((calculate_advanced_vm_cost(&staging, &profile) - (425.0 + SHARED)).abs() < 1e-9);
        assert!((calculate_advanced_vm_cost(&untagged, &profile) - (425.0 + SHARED)).abs() < 1e-9);
    }

    #[test]
    fn test_untagged_multiplier_can_be_configured() {
        let mut profile = AdvancedCostProfile::default();
        profile
            .environment_multipliers
            .insert("Untagged".to_string(), 2.0);
        let machine = vm("a", 4, 16.0, 100.0, PowerState::PoweredOn);

        let cost = calculate_advanced_vm_cost(&machine, &profile);
        assert!((cost - (850.0 + SHARED)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_multiplier_is_honoured() {
        let mut profile = AdvancedCostProfile::default();
        profile
            .environment_multipliers
            .insert("Sandbox".to_string(), 0.0);
        let machine = tagged(
            vm("a", 4, 16.0, 100.0, PowerState::PoweredOn),
            Some("Sandbox"),
            None,
            None,
        );

        // Only the shared facilities and staff share remains
        assert_eq!(calculate_advanced_vm_cost(&machine, &profile), SHARED);
    }

    #[test]
    fn test_department_override_merges_over_base() {
        let mut profile = AdvancedCostProfile::default();
        profile.department_overrides.insert(
            "DataScience".to_string(),
            CostProfileOverride {
                cpu_cost_per_core_month: Some(100.0),
                ..Default::default()
            },
        );
        let machine = tagged(
            vm("a", 4, 16.0, 100.0, PowerState::PoweredOn),
            Some("Test"),
            Some("DataScience"),
            None,
        );

        // 4*100 + 16*10 + 10 + 25 + 30 = 625, Test multiplier 0.5
        let cost = calculate_advanced_vm_cost(&machine, &profile);
        assert!((cost - (625.0 * 0.5 + SHARED)).abs() < 1e-9);
    }

    #[test]
    fn test_override_ignored_for_other_departments() {
        let mut profile = AdvancedCostProfile::default();
        profile.department_overrides.insert(
            "DataScience".to_string(),
            CostProfileOverride {
                cpu_cost_per_core_month: Some(100.0),
                ..Default::default()
            },
        );
        let machine = tagged(
            vm("a", 4, 16.0, 100.0, PowerState::PoweredOn),
            None,
            Some("IT"),
            None,
        );
        let cost = calculate_advanced_vm_cost(&machine, &profile);
        assert!((cost - (425.0 + SHARED)).abs() < 1e-9);
    }

    #[test]
    fn test_shared_cost_divisor_is_fixed_at_25() {
        // The shared cost per VM does not depend on how many VMs exist.
        let mut profile = AdvancedCostProfile::default();
        profile.base_profile = crate::models::CostProfile::zero();
        profile.facilities_cost_per_month = 2500.0;
        profile.staff_cost_per_month = 0.0;
        let machine = vm("a", 4, 16.0, 100.0, PowerState::PoweredOn);

        assert_eq!(calculate_advanced_vm_cost(&machine, &profile), 100.0);
    }

    #[test]
    fn test_powered_off_still_carries_shared_cost() {
        let machine = tagged(
            vm("a", 4, 16.0, 100.0, PowerState::PoweredOff),
            Some("Development"),
            None,
            None,
        );
        let cost = calculate_advanced_vm_cost(&machine, &AdvancedCostProfile::default());
        assert!((cost - (25.0 * 0.7 + SHARED)).abs() < 1e-9);
    }
}
