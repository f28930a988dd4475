use std::collections::VecDeque;

use log::trace;

use crate::movement::tile_of;
use crate::types::{Direction, Point, TileCoord};
use crate::world::Grid;

/// Unreached, wall, or out-of-bounds.
pub const INF: u32 = 1 << 30;

/// Breadth-first step counts from a single target tile.
#[derive(Clone, Debug)]
pub struct DistanceField {
    width: i32,
    height: i32,
    distances: Vec<u32>,
    target: Option<TileCoord>,
}

impl DistanceField {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            distances: vec![INF; (width * height) as usize],
            target: None,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Tile the field was last rebuilt from, if it was in bounds.
    pub fn target(&self) -> Option<TileCoord> {
        self.target
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    pub fn distance_at(&self, x: i32, y: i32) -> u32 {
        self.index(x, y)
            .map(|idx| self.distances[idx])
            .unwrap_or(INF)
    }

    pub fn distance_to(&self, tile: TileCoord) -> u32 {
        self.distance_at(tile.x, tile.y)
    }

    /// Recomputes every cell from `target`. An out-of-bounds target leaves
    /// the whole field at `INF`.
    pub fn rebuild(&mut self, target: Point, grid: &Grid) {
        self.distances.fill(INF);
        self.target = None;

        let start = tile_of(target);
        let Some(start_idx) = self.index(start.x, start.y) else {
            return;
        };
        self.target = Some(start);
        self.distances[start_idx] = 0;

        let mut queue = VecDeque::with_capacity(self.distances.len());
        queue.push_back(start);

        while let Some(tile) = queue.pop_front() {
            let next_distance = self.distance_to(tile) + 1;
            for dir in Direction::CARDINALS {
                let next = tile.step(dir);
                let Some(next_idx) = self.index(next.x, next.y) else {
                    continue;
                };
                if !grid.can_walk_tile(next) {
                    continue;
                }
                if self.distances[next_idx] > next_distance {
                    self.distances[next_idx] = next_distance;
                    queue.push_back(next);
                }
            }
        }
        trace!("distance field rebuilt toward ({}, {})", start.x, start.y);
    }
}
