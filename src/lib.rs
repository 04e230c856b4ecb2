//! flickcol: arcade-style 2D collision (quad-tree broad phase, X-then-Y axis resolver)

pub mod types;
pub mod config;
pub mod error;
pub mod body;
pub mod motion;
pub mod quadtree;
pub mod resolve;
pub mod tilemap;
pub mod api;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::body::{Body, BodyKind, UNBOUNDED_VELOCITY};
pub use crate::config::WorldConfig;
pub use crate::error::ConfigError;
pub use crate::quadtree::QuadTree;
pub use crate::tilemap::TileGrid;
pub use crate::world::{OverlapCallback, World};
