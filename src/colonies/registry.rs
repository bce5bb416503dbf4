use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::world::{Position, RoomName};

fn default_level() -> u8 {
    1
}

/// An independently managed cluster of rooms, anchored on its main room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colony {
    /// Colony id. Also the name of its own room.
    pub name: String,
    /// Where paths to the colony start
    pub anchor: Position,
    #[serde(default)]
    pub outposts: Vec<RoomName>,
    #[serde(default = "default_level")]
    pub level: u8,
    /// Names of directives currently bound to this colony
    #[serde(skip)]
    flags: Vec<String>,
}

impl Colony {
    pub fn new(name: impl Into<String>, anchor: Position) -> Self {
        Self {
            name: name.into(),
            anchor,
            outposts: Vec::new(),
            level: default_level(),
            flags: Vec::new(),
        }
    }

    pub fn with_outposts<R: Into<RoomName>>(mut self, outposts: impl IntoIterator<Item = R>) -> Self {
        self.outposts = outposts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn room(&self) -> RoomName {
        RoomName::new(self.name.as_str())
    }

    /// Own room followed by outposts
    pub fn owned_rooms(&self) -> impl Iterator<Item = RoomName> + '_ {
        std::iter::once(self.room()).chain(self.outposts.iter().cloned())
    }

    pub fn owns_room(&self, room: &RoomName) -> bool {
        self.name == room.as_str() || self.outposts.contains(room)
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub(crate) fn attach_flag(&mut self, directive: &str) {
        if !self.flags.iter().any(|name| name == directive) {
            self.flags.push(directive.to_string());
        }
    }

    pub(crate) fn detach_flag(&mut self, directive: &str) {
        self.flags.retain(|name| name != directive);
    }
}

/// Colony id to colony, iterated in name order, plus a room to colony index
#[derive(Debug, Clone, Default)]
pub struct ColonyRegistry {
    colonies: BTreeMap<String, Colony>,
    room_map: BTreeMap<RoomName, String>,
}

impl ColonyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a colony. Returns the colony it replaced.
    pub fn insert(&mut self, colony: Colony) -> Option<Colony> {
        debug!(colony = %colony.name, outposts = colony.outposts.len(), "Registering colony");
        let previous = self.colonies.insert(colony.name.clone(), colony);
        self.rebuild_room_map();
        previous
    }

    pub fn remove(&mut self, name: &str) -> Option<Colony> {
        let removed = self.colonies.remove(name);
        if removed.is_some() {
            self.rebuild_room_map();
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&Colony> {
        self.colonies.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Colony> {
        self.colonies.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.colonies.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Colony> {
        self.colonies.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.colonies.keys().map(String::as_str)
    }

    /// Colony owning the room, either as its own room or as an outpost
    pub fn colony_for_room(&self, room: &RoomName) -> Option<&Colony> {
        self.room_map.get(room).and_then(|name| self.colonies.get(name))
    }

    pub fn len(&self) -> usize {
        self.colonies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colonies.is_empty()
    }

    // A colony's own room always wins over another colony's outpost claim.
    // Among competing outpost claims the first colony in order wins.
    fn rebuild_room_map(&mut self) {
        self.room_map.clear();
        for colony in self.colonies.values() {
            self.room_map.insert(colony.room(), colony.name.clone());
        }
        for colony in self.colonies.values() {
            for outpost in &colony.outposts {
                self.room_map
                    .entry(outpost.clone())
                    .or_insert_with(|| colony.name.clone());
            }
        }
    }
}
