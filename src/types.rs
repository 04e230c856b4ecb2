use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Handle to a body stored in a [`crate::World`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

impl BodyId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Axis-aligned rectangle, top-left anchored (`y` grows downwards).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::new(min.x, min.y, size.x, size.y)
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn translated(mut self, delta: Vec2) -> Self {
        self.translate(delta);
        self
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let min = self.min().min(other.min());
        let max = self.max().max(other.max());
        Rect::from_min_size(min, max - min)
    }

    /// Overlap test that ignores contacts closer than `eps` (edge touches do not count).
    pub fn overlaps_eps(&self, other: &Rect, eps: f32) -> bool {
        !(self.x + self.width < other.x + eps
            || self.x + eps > other.x + other.width
            || self.y + self.height < other.y + eps
            || self.y + eps > other.y + other.height)
    }

    /// True if `self` fully covers `other`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.x + self.width >= other.x + other.width
            && self.y + self.height >= other.y + other.height
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x > self.x && p.x < self.x + self.width && p.y > self.y && p.y < self.y + self.height
    }

    /// Position along `axis`.
    #[inline]
    pub fn pos(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    #[inline]
    pub fn pos_mut(&mut self, axis: Axis) -> &mut f32 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    /// Extent along `axis` (width for X, height for Y).
    #[inline]
    pub fn extent(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    #[inline]
    pub fn extent_mut(&mut self, axis: Axis) -> &mut f32 {
        match axis {
            Axis::X => &mut self.width,
            Axis::Y => &mut self.height,
        }
    }
}

/// Resolution axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Component of `v` along this axis.
    #[inline]
    pub fn of(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    #[inline]
    pub fn of_mut(self, v: &mut Vec2) -> &mut f32 {
        match self {
            Axis::X => &mut v.x,
            Axis::Y => &mut v.y,
        }
    }

    /// Unit-scaled vector along this axis.
    #[inline]
    pub fn vec(self, amount: f32) -> Vec2 {
        match self {
            Axis::X => Vec2::new(amount, 0.0),
            Axis::Y => Vec2::new(0.0, amount),
        }
    }

    /// Sides touched on this axis as `(low, high)`.
    pub fn sides(self) -> (Side, Side) {
        match self {
            Axis::X => (Side::Left, Side::Right),
            Axis::Y => (Side::Top, Side::Bottom),
        }
    }
}

/// One edge of a body.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Side::Left | Side::Right => Axis::X,
            Side::Top | Side::Bottom => Axis::Y,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Side::Left => 1,
            Side::Right => 2,
            Side::Top => 4,
            Side::Bottom => 8,
        }
    }
}

/// Bitmask over the four sides.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SideMask(u8);

impl SideMask {
    pub const NONE: SideMask = SideMask(0);
    pub const ALL: SideMask = SideMask(0b1111);

    pub fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    pub fn set(&mut self, side: Side, on: bool) {
        if on {
            self.0 |= side.bit();
        } else {
            self.0 &= !side.bit();
        }
    }

    pub fn with(mut self, side: Side, on: bool) -> Self {
        self.set(side, on);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// One resolved contact, recorded by the axis resolver.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    pub axis: Axis,
    /// Body whose `side` was hit.
    pub a: BodyId,
    pub b: BodyId,
    /// Side of `a` that struck `b` (b was struck on the opposite side).
    pub side: Side,
    /// Penetration before the split, signed along the axis.
    pub penetration: f32,
}

/// Debug statistics for a built partition tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    /// Sum of list registrations (straddling bodies count once per node).
    pub entries: usize,
    pub max_depth: u32,
    /// Pairs that passed the broad-phase bounds test, counting duplicates.
    pub candidate_pairs: usize,
}
