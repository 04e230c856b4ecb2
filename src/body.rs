use glam::Vec2;

use crate::tilemap::TileGrid;
use crate::types::*;

/// Sentinel for "no velocity cap".
pub const UNBOUNDED_VELOCITY: f32 = 10_000.0;

/// What a body is, which decides how it reacts to hits and how it builds its hulls.
#[derive(Clone, Debug, PartialEq)]
pub enum BodyKind {
    /// Plain moving or static box.
    Sprite,
    /// Container whose position drives its members.
    Group,
    /// Box that bounces off what it hits, keeping `bounce` of its speed.
    Particle { bounce: f32 },
    /// Tile grid tested as one offset per solid cell.
    Tilemap(TileGrid),
}

/// Per-entity physics and collision state.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub kind: BodyKind,
    pub position: Vec2,
    pub size: Vec2,

    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Deceleration applied on an axis only while its acceleration is zero.
    pub drag: Vec2,
    pub max_velocity: Vec2,

    pub exists: bool,
    /// Takes part in `collide`. Non-solid bodies can still be overlap-tested.
    pub solid: bool,
    /// Stays put under collision correction unless it is itself moving.
    pub fixed: bool,
    /// Integrated by `World::step`.
    pub moves: bool,
    /// Sides allowed to take part in resolution.
    pub collide: SideMask,

    pub hull_x: Rect,
    pub hull_y: Rect,
    /// Position delta of the current tick.
    pub displacement: Vec2,
    /// Never empty.
    pub offsets: Vec<Vec2>,

    /// Set when the bottom side was hit this tick.
    pub on_floor: bool,
    /// Sides hit this tick.
    pub touching: SideMask,

    /// Non-empty for composites.
    pub members: Vec<BodyId>,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            kind: BodyKind::Sprite,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag: Vec2::ZERO,
            max_velocity: Vec2::splat(UNBOUNDED_VELOCITY),
            exists: true,
            solid: true,
            fixed: false,
            moves: true,
            collide: SideMask::ALL,
            hull_x: Rect::default(),
            hull_y: Rect::default(),
            displacement: Vec2::ZERO,
            offsets: vec![Vec2::ZERO],
            on_floor: false,
            touching: SideMask::NONE,
            members: Vec::new(),
        }
    }
}

impl Body {
    /// Movable box at `position`. Hulls start equal to the bounding box.
    pub fn new(position: Vec2, size: Vec2) -> Self {
        let mut body = Self { position, size, ..Default::default() };
        body.refresh_hulls();
        body
    }

    /// Fixed box (walls, floors).
    pub fn fixed(position: Vec2, size: Vec2) -> Self {
        let mut body = Self::new(position, size);
        body.fixed = true;
        body
    }

    /// Empty, non-solid container; its members collide individually.
    pub fn group() -> Self {
        Self { kind: BodyKind::Group, solid: false, ..Default::default() }
    }

    /// Movable box that rebounds from contacts.
    pub fn particle(position: Vec2, size: Vec2, bounce: f32) -> Self {
        let mut body = Self::new(position, size);
        body.kind = BodyKind::Particle { bounce };
        body
    }

    /// Fixed, non-moving tile grid anchored at `origin`.
    pub fn tilemap(origin: Vec2, grid: TileGrid) -> Self {
        let size = grid.size();
        let mut body = Self {
            position: origin,
            size,
            fixed: true,
            moves: false,
            kind: BodyKind::Tilemap(grid),
            ..Default::default()
        };
        body.refresh_hulls();
        body
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_offsets(mut self, offsets: Vec<Vec2>) -> Self {
        if !offsets.is_empty() {
            self.offsets = offsets;
        }
        self
    }

    /// Groups count even when empty, so they never stand in for a box.
    pub fn is_composite(&self) -> bool {
        !self.members.is_empty() || self.kind == BodyKind::Group
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    /// Bounds handed to the broad phase: the bounding box plus both swept
    /// hulls placed at every offset. Tile grids report their full extent,
    /// since their offsets are rebuilt per partner.
    pub fn broad_bounds(&self) -> Rect {
        if let BodyKind::Tilemap(_) = self.kind {
            return self.rect();
        }
        self.offsets.iter().fold(self.rect(), |bounds, &off| {
            bounds.union(&self.hull_x.translated(off)).union(&self.hull_y.translated(off))
        })
    }

    /// Rebuild both hulls from the current position and `displacement`.
    ///
    /// `hull_x` spans the horizontal sweep at the previous row, `hull_y` the
    /// vertical sweep at the current column.
    pub fn refresh_hulls(&mut self) {
        if let BodyKind::Tilemap(grid) = &self.kind {
            let cell = Rect::from_min_size(Vec2::ZERO, grid.tile_size());
            self.hull_x = cell;
            self.hull_y = cell;
            return;
        }
        let d = self.displacement;
        let prev = self.position - d;
        self.hull_x = Rect::new(prev.x.min(self.position.x), prev.y, self.size.x + d.x.abs(), self.size.y);
        self.hull_y = Rect::new(self.position.x, prev.y.min(self.position.y), self.size.x, self.size.y + d.y.abs());
    }

    pub fn hull(&self, axis: Axis) -> &Rect {
        match axis {
            Axis::X => &self.hull_x,
            Axis::Y => &self.hull_y,
        }
    }

    pub fn hull_mut(&mut self, axis: Axis) -> &mut Rect {
        match axis {
            Axis::X => &mut self.hull_x,
            Axis::Y => &mut self.hull_y,
        }
    }

    /// Called before this body is resolved against `other`. Tile grids
    /// rebuild their offsets for the window under `other`; returns false
    /// when there is nothing to collide with.
    pub fn pre_collide(&mut self, other: &Rect) -> bool {
        let BodyKind::Tilemap(grid) = &self.kind else {
            return true;
        };
        let offsets = grid.offsets_for_window(self.position, other);
        let cell = Rect::from_min_size(Vec2::ZERO, grid.tile_size());
        self.hull_x = cell;
        self.hull_y = cell;
        if offsets.is_empty() {
            self.offsets = vec![Vec2::ZERO];
            false
        } else {
            self.offsets = offsets;
            true
        }
    }

    /// Precise overlap against another bounding box.
    pub fn overlaps(&self, other: &Rect) -> bool {
        match &self.kind {
            BodyKind::Tilemap(grid) => grid.overlaps(self.position, other),
            BodyKind::Sprite | BodyKind::Group | BodyKind::Particle { .. } => {
                let r = self.rect();
                r.x < other.x + other.width
                    && r.x + r.width > other.x
                    && r.y < other.y + other.height
                    && r.y + r.height > other.y
            }
        }
    }

    /// Whether `point` lies inside the body. Box edges do not count; tile
    /// grids test the cell under the point.
    pub fn overlaps_point(&self, point: Vec2) -> bool {
        match &self.kind {
            BodyKind::Tilemap(grid) => grid.overlaps_point(self.position, point),
            _ => {
                let r = self.rect();
                point.x > r.x && point.x < r.x + r.width && point.y > r.y && point.y < r.y + r.height
            }
        }
    }

    /// React to this body's `side` striking a contact. `velocity` is the
    /// suggested new speed along the side's axis.
    pub fn hit(&mut self, side: Side, contact_fixed: bool, velocity: f32) {
        self.touching.set(side, true);
        if side == Side::Bottom {
            self.on_floor = true;
        }
        match self.kind {
            // Grids never take on velocity from what runs into them.
            BodyKind::Tilemap(_) => {}
            BodyKind::Particle { bounce } => match side {
                Side::Left | Side::Right => self.velocity.x = -self.velocity.x * bounce,
                Side::Bottom => {
                    // Slow enough to settle: land like a plain box
                    if self.velocity.y.abs() > bounce * 100.0 {
                        self.velocity.y = -self.velocity.y * bounce;
                    } else {
                        self.take_velocity(side, contact_fixed, velocity);
                    }
                    self.velocity.x *= bounce;
                }
                Side::Top => self.take_velocity(side, contact_fixed, velocity),
            },
            BodyKind::Sprite | BodyKind::Group => self.take_velocity(side, contact_fixed, velocity),
        }
    }

    fn take_velocity(&mut self, side: Side, contact_fixed: bool, velocity: f32) {
        let moving = self.velocity != Vec2::ZERO;
        if !self.fixed || (contact_fixed && moving) {
            *side.axis().of_mut(&mut self.velocity) = velocity;
        }
    }

    /// Mark as gone; `World::kill` cascades to members.
    pub fn kill(&mut self) {
        self.exists = false;
    }
}
