pub mod islands;
pub mod topology;
pub mod weights;

pub use islands::{IslandCache, IslandId};
pub use topology::{Link, Neighbor, SwitchInfo, Topology};
pub use weights::{WeightTable, WeightsError};
