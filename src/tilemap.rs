//! Tile grids that collide as a single body.
//!
//! A grid body keeps one tile-sized hull at the origin and expands into one
//! collision offset per solid cell under whatever it is being tested
//! against. The offsets are rebuilt for every pair, so the grid never
//! allocates a body per cell.

use glam::Vec2;

use crate::error::ConfigError;
use crate::types::Rect;

/// Row-major grid of tile indices. Cells with an index at or above
/// `collide_index` are solid.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_size: Vec2,
    data: Vec<u32>,
    pub collide_index: u32,
}

impl TileGrid {
    pub fn new(columns: u32, rows: u32, tile_size: Vec2, data: Vec<u32>) -> Result<Self, ConfigError> {
        if !(tile_size.x > 0.0 && tile_size.y > 0.0) {
            return Err(ConfigError::InvalidTileSize { width: tile_size.x, height: tile_size.y });
        }
        let expected = columns as usize * rows as usize;
        if data.len() != expected {
            return Err(ConfigError::TileDataMismatch { expected, actual: data.len() });
        }
        Ok(Self { columns, rows, tile_size, data, collide_index: 1 })
    }

    /// Parse comma-separated rows (one row per line). Blank lines are skipped.
    pub fn from_csv(csv: &str, tile_size: Vec2) -> Result<Self, ConfigError> {
        let mut data = Vec::new();
        let mut columns = 0usize;
        let mut rows = 0usize;
        for line in csv.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let before = data.len();
            for (column, cell) in line.split(',').enumerate() {
                let tile = cell
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::MalformedCsv { row: rows, column })?;
                data.push(tile);
            }
            let width = data.len() - before;
            if rows == 0 {
                columns = width;
            } else if width != columns {
                return Err(ConfigError::RaggedCsv { row: rows, expected: columns, actual: width });
            }
            rows += 1;
        }
        Self::new(columns as u32, rows as u32, tile_size, data)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    /// World size of the whole grid.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.columns as f32 * self.tile_size.x, self.rows as f32 * self.tile_size.y)
    }

    pub fn tile(&self, column: u32, row: u32) -> Option<u32> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.data.get(self.index(column, row)).copied()
    }

    /// Returns false if the cell is out of range.
    pub fn set_tile(&mut self, column: u32, row: u32, tile: u32) -> bool {
        if column >= self.columns || row >= self.rows {
            return false;
        }
        let i = self.index(column, row);
        self.data[i] = tile;
        true
    }

    pub fn is_solid(&self, column: u32, row: u32) -> bool {
        self.tile(column, row).is_some_and(|t| t >= self.collide_index)
    }

    fn index(&self, column: u32, row: u32) -> usize {
        row as usize * self.columns as usize + column as usize
    }

    /// Cell range `[c0, c1) x [r0, r1)` covering `query`, padded by one cell
    /// past its far edge and clamped to the grid.
    fn window(&self, origin: Vec2, query: &Rect) -> (u32, u32, u32, u32) {
        let local = query.min() - origin;
        let c0 = (local.x / self.tile_size.x).floor();
        let r0 = (local.y / self.tile_size.y).floor();
        let c1 = c0 + (query.width / self.tile_size.x).ceil() + 1.0;
        let r1 = r0 + (query.height / self.tile_size.y).ceil() + 1.0;
        let clamp = |v: f32, hi: u32| v.max(0.0).min(hi as f32) as u32;
        (
            clamp(c0, self.columns),
            clamp(r0, self.rows),
            clamp(c1, self.columns),
            clamp(r1, self.rows),
        )
    }

    /// Absolute cell origins of every solid tile in the window under `query`.
    pub fn offsets_for_window(&self, origin: Vec2, query: &Rect) -> Vec<Vec2> {
        let (c0, r0, c1, r1) = self.window(origin, query);
        let mut out = Vec::new();
        for row in r0..r1 {
            for column in c0..c1 {
                if self.is_solid(column, row) {
                    out.push(self.cell_origin(origin, column, row));
                }
            }
        }
        out
    }

    fn cell_origin(&self, origin: Vec2, column: u32, row: u32) -> Vec2 {
        origin + Vec2::new(column as f32 * self.tile_size.x, row as f32 * self.tile_size.y)
    }

    /// True if any solid cell strictly overlaps `other`.
    pub fn overlaps(&self, origin: Vec2, other: &Rect) -> bool {
        let (c0, r0, c1, r1) = self.window(origin, other);
        for row in r0..r1 {
            for column in c0..c1 {
                if !self.is_solid(column, row) {
                    continue;
                }
                let cell = Rect::from_min_size(self.cell_origin(origin, column, row), self.tile_size);
                if cell.overlaps_eps(other, 0.0) && !edge_touch(&cell, other) {
                    return true;
                }
            }
        }
        false
    }

    pub fn overlaps_point(&self, origin: Vec2, p: Vec2) -> bool {
        let local = p - origin;
        if local.x < 0.0 || local.y < 0.0 {
            return false;
        }
        let column = (local.x / self.tile_size.x) as u32;
        let row = (local.y / self.tile_size.y) as u32;
        self.is_solid(column, row)
    }
}

fn edge_touch(a: &Rect, b: &Rect) -> bool {
    a.x + a.width <= b.x || b.x + b.width <= a.x || a.y + a.height <= b.y || b.y + b.height <= a.y
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = "0,0,0,0\n0,0,0,0\n1,1,0,2\n";

    #[test]
    fn test_from_csv() {
        let g = TileGrid::from_csv(MAP, Vec2::splat(16.0)).unwrap();
        assert_eq!((g.columns(), g.rows()), (4, 3));
        assert_eq!(g.size(), Vec2::new(64.0, 48.0));
        assert_eq!(g.tile(3, 2), Some(2));
        assert!(g.is_solid(0, 2));
        assert!(!g.is_solid(2, 2));
        assert_eq!(g.tile(4, 0), None);
    }

    #[test]
    fn test_csv_errors() {
        let err = TileGrid::from_csv("0,1\n0,x\n", Vec2::splat(8.0)).unwrap_err();
        assert_eq!(err, ConfigError::MalformedCsv { row: 1, column: 1 });
        let err = TileGrid::from_csv("0,1,1\n0,1\n", Vec2::splat(8.0)).unwrap_err();
        assert_eq!(err, ConfigError::RaggedCsv { row: 1, expected: 3, actual: 2 });
        let err = TileGrid::new(2, 2, Vec2::ZERO, vec![0; 4]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTileSize { .. }));
        let err = TileGrid::new(2, 2, Vec2::ONE, vec![0; 3]).unwrap_err();
        assert_eq!(err, ConfigError::TileDataMismatch { expected: 4, actual: 3 });
    }

    #[test]
    fn test_offsets_for_window_are_absolute_and_clamped() {
        let g = TileGrid::from_csv(MAP, Vec2::splat(16.0)).unwrap();
        let origin = Vec2::new(100.0, 200.0);
        // Body standing over the two left solid cells
        let query = Rect::new(100.0, 220.0, 16.0, 16.0);
        let offsets = g.offsets_for_window(origin, &query);
        assert_eq!(offsets, vec![Vec2::new(100.0, 232.0), Vec2::new(116.0, 232.0)]);
        // Far outside the grid: empty
        assert!(g.offsets_for_window(origin, &Rect::new(-500.0, -500.0, 8.0, 8.0)).is_empty());
    }

    #[test]
    fn test_overlaps_ignores_empty_cells_and_edge_touch() {
        let mut g = TileGrid::from_csv(MAP, Vec2::splat(16.0)).unwrap();
        assert!(g.overlaps(Vec2::ZERO, &Rect::new(4.0, 30.0, 8.0, 8.0)));
        assert!(!g.overlaps(Vec2::ZERO, &Rect::new(34.0, 30.0, 8.0, 8.0)));
        // Resting exactly on top of the row
        assert!(!g.overlaps(Vec2::ZERO, &Rect::new(4.0, 24.0, 8.0, 8.0)));
        assert!(g.set_tile(2, 2, 1));
        assert!(g.overlaps(Vec2::ZERO, &Rect::new(34.0, 30.0, 8.0, 8.0)));
        assert!(!g.set_tile(9, 9, 1));
        assert!(g.overlaps_point(Vec2::ZERO, Vec2::new(40.0, 40.0)));
        assert!(!g.overlaps_point(Vec2::ZERO, Vec2::new(-1.0, 40.0)));
    }
}
