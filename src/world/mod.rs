// World model and the collaborator traits the directive engine depends on

pub mod marker;
pub mod position;
pub mod sim;
pub mod traits;

pub use marker::{Color, Marker, VariantTag};
pub use position::{Position, RoomName, ROOM_SIZE};
pub use traits::{
    AlertPriority, DistanceOracle, Notifier, PathOptions, PathResult, ProcessTable, World, WorldError,
};
