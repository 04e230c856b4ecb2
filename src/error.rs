use thiserror::Error;

/// Rejected world or tile grid configuration.
///
/// The collision path itself never fails; these only surface where the world
/// or a tile grid is set up.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// World bounds with non-positive or non-finite extents.
    #[error("world bounds must have positive finite extents (got {width}x{height})")]
    InvalidBounds { width: f32, height: f32 },
    /// The partition tree needs at least one division level.
    #[error("max_divisions must be at least 1")]
    ZeroDivisions,
    /// Rounding error, penetration limit or minimum node size out of range.
    #[error("invalid tolerance {name}: {value}")]
    InvalidTolerance { name: &'static str, value: f32 },
    /// Tile cells must have positive size.
    #[error("tile size must be positive (got {width}x{height})")]
    InvalidTileSize { width: f32, height: f32 },
    /// Tile data length does not match `columns * rows`.
    #[error("tile data holds {actual} cells, expected {expected}")]
    TileDataMismatch { expected: usize, actual: usize },
    /// A CSV cell could not be parsed as a tile index.
    #[error("malformed tile value at row {row}, column {column}")]
    MalformedCsv { row: usize, column: usize },
    /// A CSV row has a different number of cells than the first row.
    #[error("row {row} has {actual} tiles, expected {expected}")]
    RaggedCsv { row: usize, expected: usize, actual: usize },
}
