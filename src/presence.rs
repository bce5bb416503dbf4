use rand::Rng;
use tracing::{debug, info};

use crate::directive_lifecycle::{CreateOptions, DirectiveVariant, PresenceScope, Services};
use crate::errors::DirectiveError;
use crate::persistence::MemoryStore;
use crate::world::{Position, RoomName, World, WorldError, ROOM_SIZE};

/// Default number of hex digits in generated directive names
pub const DEFAULT_SUFFIX_LEN: u32 = 6;

/// Presence queries and idempotent creation for one directive variant
#[derive(Debug, Clone, Copy)]
pub struct DirectivePresence {
    variant: DirectiveVariant,
    suffix_len: u32,
}

impl DirectivePresence {
    pub fn new(variant: DirectiveVariant) -> Self {
        Self {
            variant,
            suffix_len: DEFAULT_SUFFIX_LEN,
        }
    }

    pub fn with_suffix_len(mut self, suffix_len: u32) -> Self {
        self.suffix_len = suffix_len.clamp(1, 15);
        self
    }

    pub fn variant(&self) -> DirectiveVariant {
        self.variant
    }

    /// Whether a directive of this variant already covers `pos`.
    ///
    /// Scans the global marker index, so hidden rooms are covered too. A
    /// pending relocation target stands in for the marker's own position.
    pub fn is_present(&self, world: &dyn World, memory: &MemoryStore, pos: &Position, scope: PresenceScope) -> bool {
        world
            .markers()
            .into_iter()
            .filter(|marker| self.variant.matches(marker.tag))
            .any(|marker| {
                let effective = memory
                    .get(&marker.name)
                    .and_then(|record| record.pending_relocation.clone())
                    .unwrap_or(marker.pos);
                match scope {
                    PresenceScope::Room => effective.room == pos.room,
                    PresenceScope::Position => &effective == pos,
                }
            })
    }

    /// Place a new marker of this variant and write its initial durable record
    pub fn create(
        &self,
        services: &mut Services<'_>,
        pos: &Position,
        options: CreateOptions,
    ) -> Result<String, DirectiveError> {
        let name = match options.name {
            Some(name) => {
                if services.world.marker(&name).is_some() {
                    return Err(DirectiveError::NameCollision { name });
                }
                name
            }
            None => self.generate_name(&*services.world),
        };

        services
            .world
            .create_marker(&name, pos, self.variant.tag())
            .map_err(|err| match err {
                WorldError::NameExists { name } => DirectiveError::NameCollision { name },
                other => DirectiveError::World(other),
            })?;
        services
            .memory
            .put(&name, options.memory.unwrap_or_default());

        if options.quiet {
            debug!(directive = %name, pos = %pos, "Created directive");
        } else {
            info!(directive = %name, variant = %self.variant, pos = %pos, "Created directive");
        }
        Ok(name)
    }

    /// Create a directive unless one of this variant is already present.
    ///
    /// When the target room is hidden the marker goes to the nearest
    /// walkable tile of an observable room and the real target is stored as
    /// its pending relocation.
    pub fn create_if_not_present(
        &self,
        services: &mut Services<'_>,
        pos: &Position,
        scope: PresenceScope,
        mut options: CreateOptions,
    ) -> Result<Option<String>, DirectiveError> {
        if self.is_present(&*services.world, &*services.memory, pos, scope) {
            debug!(variant = %self.variant, pos = %pos, "Directive already present");
            return Ok(None);
        }

        if services.world.is_observable(&pos.room) {
            return self.create(services, pos, options).map(Some);
        }

        let substitute = substitute_position(&*services.world, pos)
            .ok_or_else(|| DirectiveError::NoSubstitutePosition { target: pos.clone() })?;
        let mut memory = options.memory.take().unwrap_or_default();
        memory.pending_relocation = Some(pos.clone());
        options.memory = Some(memory);

        debug!(target = %pos, substitute = %substitute, "Target room hidden, placing at substitute");
        self.create(services, &substitute, options).map(Some)
    }

    fn generate_name(&self, world: &dyn World) -> String {
        let mut rng = rand::rng();
        let bound = 1u64 << (4 * self.suffix_len);
        let width = self.suffix_len as usize;
        loop {
            let suffix = rng.random_range(0..bound);
            let name = format!("{}:{:0width$x}", self.variant.prefix(), suffix, width = width);
            if world.marker(&name).is_none() {
                return name;
            }
        }
    }
}

/// Nearest walkable tile to `target` in an observable room.
///
/// Rooms are tried by room distance from the target (name order on ties),
/// starting from the same local coordinates and spiralling outward.
pub fn substitute_position(world: &dyn World, target: &Position) -> Option<Position> {
    let mut rooms: Vec<(u32, RoomName)> = world
        .observable_rooms()
        .into_iter()
        .map(|room| (target.room.linear_distance(&room).unwrap_or(u32::MAX), room))
        .collect();
    rooms.sort();

    rooms
        .into_iter()
        .find_map(|(_, room)| spiral_search(world, &room, i32::from(target.x), i32::from(target.y)))
}

fn spiral_search(world: &dyn World, room: &RoomName, x: i32, y: i32) -> Option<Position> {
    for radius in 0..ROOM_SIZE {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs().max(dy.abs()) != radius {
                    continue;
                }
                let (cx, cy) = (x + dx, y + dy);
                if !(0..ROOM_SIZE).contains(&cx) || !(0..ROOM_SIZE).contains(&cy) {
                    continue;
                }
                let candidate = Position::new(room.clone(), cx as u8, cy as u8);
                if world.is_walkable(&candidate) {
                    return Some(candidate);
                }
            }
        }
    }
    None
}
