use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Width and height of a room in tiles
pub const ROOM_SIZE: i32 = 50;

static ROOM_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([WE])(\d+)([NS])(\d+)$").expect("room name pattern is valid"));

/// Name of a room on the world grid, e.g. `W5N3` or `E11S12`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Grid coordinates of the room. West and north rooms are negative,
    /// so `W0N0` is `(-1, -1)` and `E0S0` is `(0, 0)`.
    pub fn coords(&self) -> Option<(i32, i32)> {
        let caps = ROOM_NAME_PATTERN.captures(&self.0)?;
        let horizontal: i32 = caps[2].parse().ok()?;
        let vertical: i32 = caps[4].parse().ok()?;

        let x = if &caps[1] == "W" { !horizontal } else { horizontal };
        let y = if &caps[3] == "N" { !vertical } else { vertical };
        Some((x, y))
    }

    pub fn from_coords(x: i32, y: i32) -> Self {
        // `!x` is `-x - 1` without overflow at i32::MIN
        let (horizontal, h_dir) = if x < 0 { (!x, 'W') } else { (x, 'E') };
        let (vertical, v_dir) = if y < 0 { (!y, 'N') } else { (y, 'S') };
        Self(format!("{h_dir}{horizontal}{v_dir}{vertical}"))
    }

    /// Straight-line room distance (Chebyshev on the room grid).
    /// `None` when either name is not a grid room name.
    pub fn linear_distance(&self, other: &RoomName) -> Option<u32> {
        let (ax, ay) = self.coords()?;
        let (bx, by) = other.coords()?;
        Some(ax.abs_diff(bx).max(ay.abs_diff(by)))
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RoomName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A tile in the world: room plus local offset in `0..50`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub room: RoomName,
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub fn new(room: impl Into<RoomName>, x: u8, y: u8) -> Self {
        Self {
            room: room.into(),
            x,
            y,
        }
    }

    pub fn is_in_room(&self, room: &RoomName) -> bool {
        &self.room == room
    }

    /// Absolute tile coordinates across the whole world grid.
    /// `None` for rooms too far out to address in `i32`.
    pub fn world_coords(&self) -> Option<(i32, i32)> {
        let (rx, ry) = self.room.coords()?;
        Some((
            rx.checked_mul(ROOM_SIZE)?.checked_add(i32::from(self.x))?,
            ry.checked_mul(ROOM_SIZE)?.checked_add(i32::from(self.y))?,
        ))
    }

    pub fn from_world_coords(wx: i32, wy: i32) -> Self {
        let room = RoomName::from_coords(wx.div_euclid(ROOM_SIZE), wy.div_euclid(ROOM_SIZE));
        // rem_euclid keeps both offsets in 0..ROOM_SIZE
        Self {
            room,
            x: wx.rem_euclid(ROOM_SIZE) as u8,
            y: wy.rem_euclid(ROOM_SIZE) as u8,
        }
    }

    /// Tile range ignoring terrain
    pub fn range_to(&self, other: &Position) -> Option<u32> {
        let (ax, ay) = self.world_coords()?;
        let (bx, by) = other.world_coords()?;
        Some(ax.abs_diff(bx).max(ay.abs_diff(by)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {},{}]", self.room, self.x, self.y)
    }
}
