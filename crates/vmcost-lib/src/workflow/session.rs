//! Top-level setup session
//!
//! A session starts at path selection with the default profile active. Each
//! setup path runs as its own sub-state; completing a path replaces the
//! active profile. All transitions go through [`Session::apply`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::advanced::AdvancedSetup;
use super::demo::{DemoFlow, DemoStep};
use super::guided::{GuidedInputsUpdate, GuidedSetup};
use super::quick::QuickSetup;
use crate::error::WorkflowError;
use crate::inventory::Inventory;
use crate::models::CostProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetupPath {
    Quick,
    Guided,
    Advanced,
    Demo,
}

impl SetupPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupPath::Quick => "quick",
            SetupPath::Guided => "guided",
            SetupPath::Advanced => "advanced",
            SetupPath::Demo => "demo",
        }
    }
}

impl std::fmt::Display for SetupPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetupPath {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(SetupPath::Quick),
            "guided" => Ok(SetupPath::Guided),
            "advanced" => Ok(SetupPath::Advanced),
            "demo" => Ok(SetupPath::Demo),
            _ => Err(WorkflowError::UnknownPath(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionState {
    PathSelection,
    Quick { setup: QuickSetup },
    Guided { setup: GuidedSetup },
    Advanced { setup: AdvancedSetup },
    Demo { flow: DemoFlow },
    Complete { path: SetupPath },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::PathSelection => "pathSelection",
            SessionState::Quick { .. } => "quick",
            SessionState::Guided { .. } => "guided",
            SessionState::Advanced { .. } => "advanced",
            SessionState::Demo { .. } => "demo",
            SessionState::Complete { .. } => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionAction {
    SelectPath { path: SetupPath },
    Back,
    Reset,

    SetAdjustment {
        #[serde(rename = "adjustmentPct")]
        adjustment_pct: i32,
    },
    ApplyQuick,

    UpdateGuided { inputs: GuidedInputsUpdate },
    GuidedNext,
    GuidedPrevious,
    CompleteGuided,

    EditFormula { formula: String },
    ApplyAdvanced,

    DemoCompleteStep,
    DemoNext,
    DemoPrevious,
    DemoGoto { step: DemoStep },
    FinishDemo,
}

impl SessionAction {
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::SelectPath { .. } => "selectPath",
            SessionAction::Back => "back",
            SessionAction::Reset => "reset",
            SessionAction::SetAdjustment { .. } => "setAdjustment",
            SessionAction::ApplyQuick => "applyQuick",
            SessionAction::UpdateGuided { .. } => "updateGuided",
            SessionAction::GuidedNext => "guidedNext",
            SessionAction::GuidedPrevious => "guidedPrevious",
            SessionAction::CompleteGuided => "completeGuided",
            SessionAction::EditFormula { .. } => "editFormula",
            SessionAction::ApplyAdvanced => "applyAdvanced",
            SessionAction::DemoCompleteStep => "demoCompleteStep",
            SessionAction::DemoNext => "demoNext",
            SessionAction::DemoPrevious => "demoPrevious",
            SessionAction::DemoGoto { .. } => "demoGoto",
            SessionAction::FinishDemo => "finishDemo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub state: SessionState,
    /// Profile used for all cost figures
    pub profile: CostProfile,
    pub currency: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl Session {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            state: SessionState::PathSelection,
            profile: CostProfile::default(),
            currency: currency.into(),
        }
    }

    /// Path that produced the active profile, if any
    pub fn completed_path(&self) -> Option<SetupPath> {
        match self.state {
            SessionState::Complete { path } => Some(path),
            _ => None,
        }
    }

    fn with_state(self, state: SessionState) -> Self {
        Self { state, ..self }
    }

    fn completed(self, path: SetupPath, profile: CostProfile) -> Self {
        Self {
            state: SessionState::Complete { path },
            profile,
            ..self
        }
    }

    /// Apply an action, returning the next session or the reason it was
    /// rejected. The inventory is read, never modified.
    pub fn apply(self, action: SessionAction, inventory: &Inventory) -> Result<Self, WorkflowError> {
        let invalid = WorkflowError::invalid(self.state.name(), action.name());

        match (self.state.clone(), action) {
            (_, SessionAction::Reset) => Ok(Session::new(self.currency)),

            (SessionState::PathSelection, SessionAction::Back) => Err(invalid),
            (_, SessionAction::Back) => Ok(self.with_state(SessionState::PathSelection)),

            (SessionState::PathSelection, SessionAction::SelectPath { path }) => {
                let state = match path {
                    SetupPath::Quick => SessionState::Quick {
                        setup: QuickSetup::new(inventory),
                    },
                    SetupPath::Guided => SessionState::Guided {
                        setup: GuidedSetup::new(inventory),
                    },
                    SetupPath::Advanced => SessionState::Advanced {
                        setup: AdvancedSetup::default(),
                    },
                    SetupPath::Demo => SessionState::Demo {
                        flow: DemoFlow::default(),
                    },
                };
                Ok(self.with_state(state))
            }

            (SessionState::Quick { setup }, SessionAction::SetAdjustment { adjustment_pct }) => {
                let setup = setup.with_adjustment(adjustment_pct)?;
                Ok(self.with_state(SessionState::Quick { setup }))
            }
            (SessionState::Quick { setup }, SessionAction::ApplyQuick) => {
                Ok(self.completed(SetupPath::Quick, setup.profile()))
            }

            (SessionState::Guided { setup }, SessionAction::UpdateGuided { inputs }) => {
                let setup = setup.with_inputs(&inputs);
                Ok(self.with_state(SessionState::Guided { setup }))
            }
            (SessionState::Guided { setup }, SessionAction::GuidedNext) => {
                let setup = setup.next()?;
                Ok(self.with_state(SessionState::Guided { setup }))
            }
            (SessionState::Guided { setup }, SessionAction::GuidedPrevious) => {
                let setup = setup.previous()?;
                Ok(self.with_state(SessionState::Guided { setup }))
            }
            (SessionState::Guided { setup }, SessionAction::CompleteGuided) => {
                let profile = setup.complete()?;
                Ok(self.completed(SetupPath::Guided, profile))
            }

            (SessionState::Advanced { setup }, SessionAction::EditFormula { formula }) => {
                let setup = setup.with_formula(formula);
                Ok(self.with_state(SessionState::Advanced { setup }))
            }
            (SessionState::Advanced { setup }, SessionAction::ApplyAdvanced) => {
                Ok(self.completed(SetupPath::Advanced, setup.apply()))
            }

            (SessionState::Demo { flow }, SessionAction::DemoCompleteStep) => {
                let flow = flow.complete_step(inventory, &self.currency);
                Ok(self.with_state(SessionState::Demo { flow }))
            }
            (SessionState::Demo { flow }, SessionAction::DemoNext) => {
                let flow = flow.next()?;
                Ok(self.with_state(SessionState::Demo { flow }))
            }
            (SessionState::Demo { flow }, SessionAction::DemoPrevious) => {
                let flow = flow.previous()?;
                Ok(self.with_state(SessionState::Demo { flow }))
            }
            (SessionState::Demo { flow }, SessionAction::DemoGoto { step }) => {
                let flow = flow.goto(step)?;
                Ok(self.with_state(SessionState::Demo { flow }))
            }
            (SessionState::Demo { flow }, SessionAction::FinishDemo) => {
                if let Some(step) = DemoStep::ALL.into_iter().find(|s| !flow.is_complete(*s)) {
                    return Err(WorkflowError::StepIncomplete { step: step.title() });
                }
                match flow.profile() {
                    Some(profile) => Ok(self.completed(SetupPath::Demo, profile)),
                    None => Err(WorkflowError::StepIncomplete {
                        step: DemoStep::BuildProfile.title(),
                    }),
                }
            }

            _ => Err(invalid),
        }
    }
}
