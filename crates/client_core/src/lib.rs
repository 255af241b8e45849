//! Client-side state synchronization for the controller panels.
//!
//! Each panel owns one [`StateStore`] that the presentation layer renders
//! from. Intents go through the panel, which writes optimistic state where
//! the outcome is predictable, calls the controller through a gateway, and
//! reconciles the store with whatever the controller reports.

pub mod devices;
pub mod error;
pub mod gateway;
pub mod motor;
pub mod session;
pub mod store;
pub mod sync;

pub use devices::{DevicePanel, DevicePatch};
pub use error::{GatewayError, SessionSetupError};
pub use gateway::{DeviceGateway, HttpGateway, MotorGateway, StateSource};
pub use motor::{default_motor_options, MotorPanel};
pub use session::{ControlSession, SessionOptions, DEFAULT_SERVER_URL};
pub use store::{PanelState, StateStore, Ticket, WriteResult};
pub use sync::{
    AlertSink, CommandId, CommandOutcome, CommandPhase, FailurePolicy, LogAlertSink,
    RefreshOutcome, ResponseOrdering, SyncCore, SyncEvent, SyncFailure, SyncOptions, SyncStatus,
};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
