//! Setup workflows that produce a cost profile
//!
//! Every workflow is an immutable value; transitions return a new value or a
//! [`WorkflowError`](crate::error::WorkflowError).

pub mod advanced;
pub mod demo;
pub mod guided;
pub mod quick;
pub mod session;

pub use advanced::{AdvancedSetup, ADVANCED_PROFILE, DEFAULT_FORMULA};
pub use demo::{demo_profile, DemoFlow, DemoResults, DemoStep};
pub use guided::{FleetCapacity, GuidedInputs, GuidedInputsUpdate, GuidedSetup, GuidedStep};
pub use quick::{adjusted_profile, QuickSetup, MAX_ADJUSTMENT_PCT, MIN_ADJUSTMENT_PCT};
pub use session::{Session, SessionAction, SessionState, SetupPath};
