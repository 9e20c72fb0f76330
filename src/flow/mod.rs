pub mod installer;
pub mod matching;

pub use installer::{DEFAULT_IDLE_TIMEOUT, FlowInstaller, Placement};
pub use matching::FlowMatch;
