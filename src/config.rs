use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Rect;

/// World-level configuration for the broad phase and the axis resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Root bounds of the partition tree. Bodies outside still collide, they
    /// just all land in the root node.
    pub bounds: Rect,
    /// Maximum subdivision depth of the partition tree.
    pub max_divisions: u32,
    /// Nodes stop subdividing once their quadrants would be smaller than `min_node_size²`.
    pub min_node_size: f32,
    /// Overlap tolerance; contacts closer than this count as touching, not overlapping.
    pub rounding_error: f32,
    /// Penetrations deeper than this fraction of a movable hull are skipped.
    pub penetration_limit: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: Rect::new(-10_000.0, -10_000.0, 20_000.0, 20_000.0),
            max_divisions: 3,
            min_node_size: 16.0,
            rounding_error: 0.0001,
            penetration_limit: 0.8,
        }
    }
}

impl WorldConfig {
    /// Config with the given root bounds and division budget, defaults elsewhere.
    pub fn with_bounds(bounds: Rect, max_divisions: u32) -> Self {
        Self { bounds, max_divisions, ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bounds(&self.bounds)?;
        if self.max_divisions == 0 {
            return Err(ConfigError::ZeroDivisions);
        }
        if !(self.min_node_size.is_finite() && self.min_node_size >= 0.0) {
            return Err(ConfigError::InvalidTolerance {
                name: "min_node_size",
                value: self.min_node_size,
            });
        }
        if !(self.rounding_error.is_finite() && self.rounding_error >= 0.0) {
            return Err(ConfigError::InvalidTolerance {
                name: "rounding_error",
                value: self.rounding_error,
            });
        }
        if !(self.penetration_limit > 0.0 && self.penetration_limit <= 1.0) {
            return Err(ConfigError::InvalidTolerance {
                name: "penetration_limit",
                value: self.penetration_limit,
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_bounds(bounds: &Rect) -> Result<(), ConfigError> {
    let finite = bounds.x.is_finite()
        && bounds.y.is_finite()
        && bounds.width.is_finite()
        && bounds.height.is_finite();
    if !finite || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Err(ConfigError::InvalidBounds { width: bounds.width, height: bounds.height });
    }
    Ok(())
}
