//! Quick setup: benchmark rates with a single regional adjustment

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::inventory::{Inventory, InventorySummary};
use crate::models::CostProfile;

pub const MIN_ADJUSTMENT_PCT: i32 = -30;
pub const MAX_ADJUSTMENT_PCT: i32 = 50;

/// Default profile with every rate scaled by `1 + adjustment/100`
pub fn adjusted_profile(adjustment_pct: i32) -> CostProfile {
    CostProfile::default().scaled(1.0 + adjustment_pct as f64 / 100.0)
}

/// Quick setup state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickSetup {
    pub adjustment_pct: i32,
    /// Auto-detected fleet figures shown alongside the rates
    pub detected: InventorySummary,
}

impl QuickSetup {
    pub fn new(inventory: &Inventory) -> Self {
        Self {
            adjustment_pct: 0,
            detected: inventory.summary(),
        }
    }

    /// Set the regional adjustment, rejecting values outside [-30, +50]
    pub fn with_adjustment(self, adjustment_pct: i32) -> Result<Self, WorkflowError> {
        if !(MIN_ADJUSTMENT_PCT..=MAX_ADJUSTMENT_PCT).contains(&adjustment_pct) {
            return Err(WorkflowError::AdjustmentOutOfRange {
                value: adjustment_pct,
                min: MIN_ADJUSTMENT_PCT,
                max: MAX_ADJUSTMENT_PCT,
            });
        }
        Ok(Self {
            adjustment_pct,
            ..self
        })
    }

    pub fn profile(&self) -> CostProfile {
        adjusted_profile(self.adjustment_pct)
    }
}
