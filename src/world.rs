use crate::error::LevelError;
use crate::types::{CellKind, Direction, GridView, TileCoord};

pub const WALL_MARKER: char = '#';
pub const PELLET_MARKER: char = '.';
pub const EMPTY_MARKER: char = ' ';
pub const ITEM_MARKER: char = 'a';
pub const PLAYER_SPAWN_MARKER: char = 'P';
pub const GHOST_SPAWN_MARKER: char = 'G';

const DEFAULT_MAZE: [&str; 11] = [
    "#####################",
    "#...................#",
    "#.###.#.###.#.###.###",
    "#.#...#...#...#...#.#",
    "#.#.#####.#.#####.#.#",
    "#...................#",
    "#.###.#.###.#.###.###",
    "#.#...#...#...#...#.#",
    "#.#.#####.#.#####.#.#",
    "#...................#",
    "#####################",
];

/// Ordered block of equal-width rows, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDefinition {
    rows: Vec<String>,
}

impl LevelDefinition {
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits a text block into rows. Trailing line endings are dropped but
    /// spaces are kept, since a space is a walkable tile.
    pub fn parse_block(text: &str) -> Self {
        Self::from_rows(
            text.lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn default_maze() -> Self {
        Self::from_rows(DEFAULT_MAZE)
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }
}

/// Something removed from the grid by [`Grid::consume`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consumable {
    Pellet,
    Item,
}

#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<CellKind>,
    total_pellets: u32,
    remaining_pellets: u32,
    player_marker: Option<TileCoord>,
    ghost_markers: Vec<TileCoord>,
    item_tiles: Vec<TileCoord>,
}

impl Grid {
    pub fn parse(definition: &LevelDefinition) -> Result<Self, LevelError> {
        let rows = definition.rows();
        let first = rows.first().ok_or(LevelError::Empty)?;
        let width = first.chars().count();
        if width == 0 {
            return Err(LevelError::EmptyRow);
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        let mut total_pellets = 0u32;
        let mut player_marker = None;
        let mut ghost_markers = Vec::new();
        let mut item_tiles = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(LevelError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, marker) in row.chars().enumerate() {
                let tile = TileCoord::new(x as i32, y as i32);
                let cell = match marker {
                    WALL_MARKER => CellKind::Wall,
                    PELLET_MARKER => {
                        total_pellets += 1;
                        CellKind::Pellet
                    }
                    EMPTY_MARKER => CellKind::Empty,
                    ITEM_MARKER => {
                        item_tiles.push(tile);
                        CellKind::Item
                    }
                    PLAYER_SPAWN_MARKER => {
                        player_marker.get_or_insert(tile);
                        CellKind::Empty
                    }
                    GHOST_SPAWN_MARKER => {
                        ghost_markers.push(tile);
                        CellKind::Empty
                    }
                    other => {
                        return Err(LevelError::UnknownMarker {
                            marker: other,
                            x,
                            y,
                        })
                    }
                };
                cells.push(cell);
            }
        }

        if cells.iter().all(|cell| *cell == CellKind::Wall) {
            return Err(LevelError::NoWalkableTile);
        }

        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            cells,
            total_pellets,
            remaining_pellets: total_pellets,
            player_marker,
            ghost_markers,
            item_tiles,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    /// Out-of-bounds coordinates read as `Wall`.
    pub fn cell(&self, x: i32, y: i32) -> CellKind {
        self.index(x, y)
            .map(|idx| self.cells[idx])
            .unwrap_or(CellKind::Wall)
    }

    pub fn can_walk(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) != CellKind::Wall
    }

    pub fn can_walk_tile(&self, tile: TileCoord) -> bool {
        self.can_walk(tile.x, tile.y)
    }

    /// Walkable 4-neighbors of a tile.
    pub fn exit_count(&self, tile: TileCoord) -> usize {
        Direction::CARDINALS
            .iter()
            .filter(|dir| self.can_walk_tile(tile.step(**dir)))
            .count()
    }

    /// Clears a pellet or item to `Empty`. Repeated calls on the same cell
    /// return `None` after the first.
    pub fn consume(&mut self, x: i32, y: i32) -> Option<Consumable> {
        let idx = self.index(x, y)?;
        let consumed = match self.cells[idx] {
            CellKind::Pellet => {
                self.remaining_pellets = self.remaining_pellets.saturating_sub(1);
                Consumable::Pellet
            }
            CellKind::Item => Consumable::Item,
            CellKind::Wall | CellKind::Empty => return None,
        };
        self.cells[idx] = CellKind::Empty;
        Some(consumed)
    }

    /// All non-wall tiles in row-major order.
    pub fn walkable_tiles(&self) -> Vec<TileCoord> {
        let mut tiles = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.can_walk(x, y) {
                    tiles.push(TileCoord::new(x, y));
                }
            }
        }
        tiles
    }

    pub fn total_pellets(&self) -> u32 {
        self.total_pellets
    }

    pub fn remaining_pellets(&self) -> u32 {
        self.remaining_pellets
    }

    pub fn item_tiles(&self) -> &[TileCoord] {
        &self.item_tiles
    }

    /// `P` marker if present, otherwise the top-left interior tile.
    pub fn player_spawn(&self) -> TileCoord {
        let preferred = self.player_marker.unwrap_or(TileCoord::new(1, 1));
        self.nearest_walkable(preferred).unwrap_or(preferred)
    }

    /// `G` markers if present, otherwise three inner corners plus the middle.
    pub fn ghost_spawns(&self) -> Vec<TileCoord> {
        let preferred = if self.ghost_markers.is_empty() {
            vec![
                TileCoord::new(self.width - 2, 1),
                TileCoord::new(self.width - 2, self.height - 2),
                TileCoord::new(1, self.height - 2),
                TileCoord::new(self.width / 2, self.height / 2),
            ]
        } else {
            self.ghost_markers.clone()
        };
        preferred
            .into_iter()
            .map(|tile| self.nearest_walkable(tile).unwrap_or(tile))
            .collect()
    }

    /// Inner corners, clockwise from the top-left.
    pub fn corner_tiles(&self) -> [TileCoord; 4] {
        let corners = [
            TileCoord::new(1, 1),
            TileCoord::new(self.width - 2, 1),
            TileCoord::new(self.width - 2, self.height - 2),
            TileCoord::new(1, self.height - 2),
        ];
        corners.map(|tile| self.nearest_walkable(tile).unwrap_or(tile))
    }

    /// Closest walkable tile by Manhattan distance; ties go to the upper row,
    /// then the left column.
    pub fn nearest_walkable(&self, target: TileCoord) -> Option<TileCoord> {
        if self.can_walk_tile(target) {
            return Some(target);
        }
        let mut best: Option<(i32, i32, i32, TileCoord)> = None;
        for tile in self.walkable_tiles() {
            let key = (tile.manhattan(target), tile.y, tile.x, tile);
            if best
                .map(|v| (v.0, v.1, v.2) > (key.0, key.1, key.2))
                .unwrap_or(true)
            {
                best = Some(key);
            }
        }
        best.map(|(_, _, _, tile)| tile)
    }

    pub fn rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| match self.cell(x, y) {
                        CellKind::Wall => WALL_MARKER,
                        CellKind::Empty => EMPTY_MARKER,
                        CellKind::Pellet => PELLET_MARKER,
                        CellKind::Item => ITEM_MARKER,
                    })
                    .collect()
            })
            .collect()
    }

    pub fn to_view(&self) -> GridView {
        GridView {
            width: self.width,
            height: self.height,
            rows: self.rows(),
        }
    }
}
