pub mod algorithms;
pub mod config;
pub mod controller;
pub mod device;
pub mod flow;
pub mod host_table;
pub mod messages;
pub mod network;
pub mod routing;
pub mod types;

/// Datapath id of a switch.
pub type SwitchId = u64;
pub type PortNo = u16;

pub use config::ControllerConfig;
pub use controller::{Controller, Disposition};
pub use device::{ChannelDevice, DeviceCommand, DeviceSession};
pub use messages::{Event, Notification, PacketIn};
