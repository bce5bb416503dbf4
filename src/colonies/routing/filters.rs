use crate::world::RoomName;

/// Room-distance gate applied before any path query.
///
/// Rooms without grid coordinates cannot be measured and only pass when
/// portals are allowed.
pub fn within_linear_range(from: &RoomName, to: &RoomName, max_range: u32, allow_portals: bool) -> bool {
    if allow_portals {
        return true;
    }
    from.linear_distance(to)
        .is_some_and(|distance| distance <= max_range)
}
