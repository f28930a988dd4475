use crate::types::TileCoord;

use super::PLAYER_INDEX;

/// Position of a ghost among the ghosts, given its arena index.
pub(super) fn ghost_slot(index: usize) -> usize {
    index.saturating_sub(PLAYER_INDEX + 1)
}

pub(super) fn scatter_corner(corners: &[TileCoord; 4], slot: usize) -> TileCoord {
    corners[slot % corners.len()]
}

/// Home corner and the diagonally opposite one.
pub(super) fn patrol_route(corners: &[TileCoord; 4], slot: usize) -> [TileCoord; 2] {
    [
        corners[slot % corners.len()],
        corners[(slot + 2) % corners.len()],
    ]
}
