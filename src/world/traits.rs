// Collaborator seams - the engine only ever talks to the world through these

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::marker::{Marker, VariantTag};
use super::position::{Position, RoomName};
use crate::directive_lifecycle::Directive;

#[cfg(test)]
use mockall::automock;

/// Failures of the marker storage primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("a marker named {name} already exists")]
    NameExists { name: String },

    #[error("room {room} is not observable")]
    NotObservable { room: RoomName },

    #[error("no marker named {name}")]
    UnknownMarker { name: String },

    #[error("position {pos} cannot hold a marker")]
    InvalidPosition { pos: Position },
}

/// Marker storage and visibility of the simulated world
pub trait World {
    /// Current simulation tick
    fn tick(&self) -> u64;

    /// Look up a marker by name
    fn marker(&self, name: &str) -> Option<Marker>;

    /// Global marker index, ordered by name
    fn markers(&self) -> Vec<Marker>;

    /// Place a new marker
    fn create_marker(&mut self, name: &str, pos: &Position, tag: VariantTag) -> Result<(), WorldError>;

    /// Delete a marker. Returns whether it existed.
    fn remove_marker(&mut self, name: &str) -> bool;

    /// Request a marker move. Moves are applied when the tick advances.
    fn set_marker_position(&mut self, name: &str, pos: &Position) -> Result<(), WorldError>;

    /// Whether the room is currently visible
    fn is_observable(&self, room: &RoomName) -> bool;

    /// All currently visible rooms
    fn observable_rooms(&self) -> Vec<RoomName>;

    /// Whether a visible tile can be walked on
    fn is_walkable(&self, pos: &Position) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathOptions {
    pub max_ops: u32,
}

/// Output of a path search
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathResult {
    pub path: Vec<Position>,
    pub incomplete: bool,
}

impl PathResult {
    pub fn length(&self) -> u32 {
        self.path.len() as u32
    }
}

/// Black-box path search between two positions
#[cfg_attr(test, automock)]
pub trait DistanceOracle {
    fn find_path(&self, origin: &Position, goal: &Position, options: &PathOptions) -> PathResult;
}

/// Process-table registrar notified when directives come and go
pub trait ProcessTable {
    fn register_directive(&mut self, directive: &Directive);

    fn remove_directive(&mut self, name: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertPriority {
    Critical,
    High,
    Normal,
    Low,
}

/// Alert side channel
pub trait Notifier {
    fn alert(&mut self, message: &str, room: &RoomName, priority: AlertPriority);
}
