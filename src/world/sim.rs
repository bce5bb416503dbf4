// In-memory world used by the CLI simulator and by tests

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

use super::marker::{Marker, VariantTag};
use super::position::{Position, RoomName, ROOM_SIZE};
use super::traits::{
    AlertPriority, DistanceOracle, Notifier, PathOptions, PathResult, ProcessTable, World, WorldError,
};
use crate::colonies::{Colony, ColonyRegistry};
use crate::directive_lifecycle::Directive;
use crate::persistence::{DirectiveMemory, MemoryStore};

/// Simulated world: markers, visibility, walls and a tick counter.
/// Marker moves are queued and only applied by [`SimWorld::advance`].
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    tick: u64,
    markers: BTreeMap<String, Marker>,
    observable: BTreeSet<RoomName>,
    walls: BTreeSet<Position>,
    pending_moves: BTreeMap<String, Position>,
}

impl SimWorld {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }

    pub fn with_observable<R: Into<RoomName>>(mut self, rooms: impl IntoIterator<Item = R>) -> Self {
        self.observable.extend(rooms.into_iter().map(Into::into));
        self
    }

    pub fn observe(&mut self, room: impl Into<RoomName>) {
        self.observable.insert(room.into());
    }

    pub fn hide(&mut self, room: &RoomName) {
        self.observable.remove(room);
    }

    pub fn add_wall(&mut self, pos: Position) {
        self.walls.insert(pos);
    }

    /// Place a marker without any visibility checks (world setup)
    pub fn place_marker(&mut self, marker: Marker) {
        self.markers.insert(marker.name.clone(), marker);
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn pending_move(&self, name: &str) -> Option<&Position> {
        self.pending_moves.get(name)
    }

    /// Move to the next tick, applying queued marker moves
    pub fn advance(&mut self) {
        self.tick += 1;
        for (name, pos) in std::mem::take(&mut self.pending_moves) {
            if let Some(marker) = self.markers.get_mut(&name) {
                debug!(marker = %name, from = %marker.pos, to = %pos, "Applied marker move");
                marker.pos = pos;
            }
        }
    }

    fn check_placeable(&self, pos: &Position) -> Result<(), WorldError> {
        if !self.is_observable(&pos.room) {
            return Err(WorldError::NotObservable {
                room: pos.room.clone(),
            });
        }
        if !self.is_walkable(pos) {
            return Err(WorldError::InvalidPosition { pos: pos.clone() });
        }
        Ok(())
    }
}

impl World for SimWorld {
    fn tick(&self) -> u64 {
        self.tick
    }

    fn marker(&self, name: &str) -> Option<Marker> {
        self.markers.get(name).cloned()
    }

    fn markers(&self) -> Vec<Marker> {
        self.markers.values().cloned().collect()
    }

    fn create_marker(&mut self, name: &str, pos: &Position, tag: VariantTag) -> Result<(), WorldError> {
        if self.markers.contains_key(name) {
            return Err(WorldError::NameExists {
                name: name.to_string(),
            });
        }
        self.check_placeable(pos)?;
        self.markers
            .insert(name.to_string(), Marker::new(name, pos.clone(), tag));
        Ok(())
    }

    fn remove_marker(&mut self, name: &str) -> bool {
        self.pending_moves.remove(name);
        self.markers.remove(name).is_some()
    }

    fn set_marker_position(&mut self, name: &str, pos: &Position) -> Result<(), WorldError> {
        if !self.markers.contains_key(name) {
            return Err(WorldError::UnknownMarker {
                name: name.to_string(),
            });
        }
        self.check_placeable(pos)?;
        self.pending_moves.insert(name.to_string(), pos.clone());
        Ok(())
    }

    fn is_observable(&self, room: &RoomName) -> bool {
        self.observable.contains(room)
    }

    fn observable_rooms(&self) -> Vec<RoomName> {
        self.observable.iter().cloned().collect()
    }

    fn is_walkable(&self, pos: &Position) -> bool {
        let in_bounds = i32::from(pos.x) < ROOM_SIZE && i32::from(pos.y) < ROOM_SIZE;
        in_bounds && self.is_observable(&pos.room) && !self.walls.contains(pos)
    }
}

/// Straight-line oracle over the world grid. Paths touching a blocked room
/// come back incomplete.
#[derive(Debug, Default)]
pub struct GridOracle {
    blocked_rooms: BTreeSet<RoomName>,
    queries: Cell<u32>,
}

impl GridOracle {
    pub fn new<R: Into<RoomName>>(blocked_rooms: impl IntoIterator<Item = R>) -> Self {
        Self {
            blocked_rooms: blocked_rooms.into_iter().map(Into::into).collect(),
            queries: Cell::new(0),
        }
    }

    pub fn queries(&self) -> u32 {
        self.queries.get()
    }
}

impl DistanceOracle for GridOracle {
    fn find_path(&self, origin: &Position, goal: &Position, options: &PathOptions) -> PathResult {
        self.queries.set(self.queries.get() + 1);

        if self.blocked_rooms.contains(&origin.room) || self.blocked_rooms.contains(&goal.room) {
            return PathResult {
                path: Vec::new(),
                incomplete: true,
            };
        }
        let (Some((mut x, mut y)), Some((gx, gy))) = (origin.world_coords(), goal.world_coords())
        else {
            return PathResult {
                path: Vec::new(),
                incomplete: true,
            };
        };

        let mut path = Vec::new();
        while (x, y) != (gx, gy) {
            if path.len() as u32 >= options.max_ops {
                return PathResult {
                    path,
                    incomplete: true,
                };
            }
            x += gx.cmp(&x) as i32;
            y += gy.cmp(&y) as i32;
            path.push(Position::from_world_coords(x, y));
        }

        PathResult {
            path,
            incomplete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProcessEvent {
    Registered { name: String, colony: Option<String> },
    Removed { name: String },
}

/// Process table that remembers what was registered
#[derive(Debug, Default)]
pub struct RecordingProcessTable {
    registered: BTreeMap<String, Option<String>>,
    events: Vec<ProcessEvent>,
}

impl RecordingProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.contains_key(name)
    }

    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.registered.keys().map(String::as_str)
    }

    pub fn events(&self) -> &[ProcessEvent] {
        &self.events
    }
}

impl ProcessTable for RecordingProcessTable {
    fn register_directive(&mut self, directive: &Directive) {
        let colony = directive.colony().map(str::to_string);
        self.registered
            .insert(directive.name().to_string(), colony.clone());
        self.events.push(ProcessEvent::Registered {
            name: directive.name().to_string(),
            colony,
        });
    }

    fn remove_directive(&mut self, name: &str) {
        self.registered.remove(name);
        self.events.push(ProcessEvent::Removed {
            name: name.to_string(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub message: String,
    pub room: RoomName,
    pub priority: AlertPriority,
}

/// Notifier that logs every alert and keeps it for inspection
#[derive(Debug, Default)]
pub struct LogNotifier {
    alerts: Vec<Alert>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn drain(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }
}

impl Notifier for LogNotifier {
    fn alert(&mut self, message: &str, room: &RoomName, priority: AlertPriority) {
        match priority {
            AlertPriority::Critical | AlertPriority::High => {
                warn!(room = %room, priority = ?priority, "{}", message)
            }
            _ => info!(room = %room, priority = ?priority, "{}", message),
        }
        self.alerts.push(Alert {
            message: message.to_string(),
            room: room.clone(),
            priority,
        });
    }
}

/// Scenario file consumed by the `simulate` command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub tick: u64,
    #[serde(default)]
    pub observable_rooms: Vec<RoomName>,
    #[serde(default)]
    pub walls: Vec<Position>,
    #[serde(default)]
    pub blocked_rooms: Vec<RoomName>,
    #[serde(default)]
    pub colonies: Vec<Colony>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub memory: BTreeMap<String, DirectiveMemory>,
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        let scenario = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))?;
        Ok(scenario)
    }

    pub fn world(&self) -> SimWorld {
        let mut world = SimWorld::new(self.tick).with_observable(self.observable_rooms.iter().cloned());
        for wall in &self.walls {
            world.add_wall(wall.clone());
        }
        for marker in &self.markers {
            world.place_marker(marker.clone());
        }
        world
    }

    pub fn oracle(&self) -> GridOracle {
        GridOracle::new(self.blocked_rooms.iter().cloned())
    }

    pub fn colonies(&self) -> ColonyRegistry {
        let mut registry = ColonyRegistry::new();
        for colony in &self.colonies {
            registry.insert(colony.clone());
        }
        registry
    }

    /// Scenario memory layered over whatever the store already holds
    pub fn seed_memory(&self, store: &mut MemoryStore) {
        for (name, record) in &self.memory {
            if !store.contains(name) {
                store.put(name, record.clone());
            }
        }
    }
}
