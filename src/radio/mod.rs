mod channel;
mod controller;
mod daemon;
mod error;
mod mode;

pub use channel::RigctlConnector;
pub use controller::{RadioController, RadioLinkState, DEFAULT_SETTLE};
pub use daemon::ProcessDaemon;
pub use error::RadioError;
