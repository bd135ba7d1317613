//! Step sequencer and status projection
//!
//! The orchestration core. One engine instance drives one flow at a time:
//! idle, optional sequential approvals, the bounded action, receipt
//! confirmation, then a settle window that resets back to idle. The UI never
//! reads raw engine state; it consumes the projections in `status`.

pub mod sequencer;
pub mod status;
pub mod step;

pub use sequencer::{Engine, RefetchHook};
pub use status::{project_button, project_status, ButtonState, FlowSnapshot, TransactionStatus};
pub use step::Step;
