use glam::Vec2;

use crate::body::Body;
use crate::config::WorldConfig;
use crate::error::ConfigError;
use crate::tilemap::TileGrid;
use crate::types::*;
use crate::world::OverlapCallback;

/// Public API contract for the collision world.
pub trait CollisionWorldApi {
    /// Construct a new world; fails if the configuration does not validate.
    fn new(cfg: WorldConfig) -> Result<Self, ConfigError>
    where
        Self: Sized;

    /// Replace the partition root bounds. `divisions == 0` keeps the current
    /// division budget.
    fn set_world_bounds(&mut self, bounds: Rect, divisions: u32) -> Result<(), ConfigError>;

    // --- Bodies ------------------------------------------------------------

    /// Insert a body and return its handle.
    fn add(&mut self, body: Body) -> BodyId;

    /// Convenience: insert a fixed tile grid anchored at `origin`.
    fn add_tilemap(&mut self, origin: Vec2, grid: TileGrid) -> BodyId;

    /// Insert a non-solid group owning `members`.
    fn add_group(&mut self, members: &[BodyId]) -> BodyId;

    /// Attach `member` to `group`. Returns false for unknown ids, duplicates
    /// and membership cycles.
    fn add_member(&mut self, group: BodyId, member: BodyId) -> bool;

    /// Detach `member` from `group`, closing the gap. The member itself is
    /// left untouched. Returns false if it was not a member.
    fn remove_member(&mut self, group: BodyId, member: BodyId) -> bool;

    /// Put `new` in the slot `old` held, keeping member order. Returns false
    /// when `old` is not a member or `new` is rejected as by `add_member`.
    fn replace_member(&mut self, group: BodyId, old: BodyId, new: BodyId) -> bool;

    fn get(&self, id: BodyId) -> Option<&Body>;

    fn get_mut(&mut self, id: BodyId) -> Option<&mut Body>;

    // --- Motion ------------------------------------------------------------

    /// Integrate every existing body over `dt`, then carry group motion to members.
    fn step(&mut self, dt: f32);

    /// Move to `position` and revive. Existing members move by the same delta.
    fn reset(&mut self, id: BodyId, position: Vec2);

    /// Shift by `delta`, carrying existing members along.
    fn translate(&mut self, id: BodyId, delta: Vec2);

    /// Mark as gone, together with all members.
    fn kill(&mut self, id: BodyId);

    // --- Dispatch ----------------------------------------------------------

    /// Report every overlapping pair between `a` and `b` (or within `a` when
    /// both are the same slice) to `callback`. Without a callback both
    /// bodies of each pair are killed. Returns true if any callback did.
    fn overlap(&mut self, a: &[BodyId], b: &[BodyId], callback: Option<OverlapCallback<'_>>) -> bool;

    /// Separate overlapping solid bodies: an X pass over every candidate
    /// pair, then a Y pass. Returns true if either pass resolved anything.
    fn collide(&mut self, a: &[BodyId], b: &[BodyId]) -> bool;

    /// Drain and return the contacts resolved since the last drain.
    fn drain_contacts(&mut self) -> Vec<Contact>;
}
