//! Axis-separated overlap resolution.
//!
//! `collide` runs [`solve_axis`] with [`Axis::X`] over every candidate pair,
//! then again with [`Axis::Y`]. Each call works on one axis only: it decides
//! which side each body struck from their displacements, walks every offset
//! combination of the two bodies, pushes them apart, fires hit reactions and
//! closes the used-up part of the swept hulls so repeated calls are no-ops.

use glam::Vec2;
use tracing::trace;

use crate::api::CollisionWorldApi;
use crate::body::Body;
use crate::types::*;
use crate::world::World;

/// True when the first body sits on the low side of the second along the
/// axis, judged from their signed displacements `o1` and `o2`.
///
/// Same-direction motion is decided by who is faster: the faster body is
/// catching up from behind.
pub fn first_is_low(o1: f32, o2: f32) -> bool {
    (o1 == 0.0 && o2 < 0.0)
        || (o1 > 0.0 && o2 == 0.0)
        || (o1 > 0.0 && o2 < 0.0)
        || (o1 < 0.0 && o2 < 0.0 && o1.abs() < o2.abs())
        || (o1 > 0.0 && o2 > 0.0 && o1.abs() > o2.abs())
}

/// Per-pair facts that do not change across offsets.
struct PairCtx {
    a: BodyId,
    b: BodyId,
    axis: Axis,
    o1: f32,
    o2: f32,
    a_low: bool,
    /// Fixed after demotion; the body is not pushed.
    f1: bool,
    f2: bool,
    eps: f32,
    limit: f32,
}

/// Separate `a` and `b` along `axis`. Returns true if any offset pair was
/// resolved. Unknown, dead and non-solid bodies never collide.
pub fn solve_axis(world: &mut World, a: BodyId, b: BodyId, axis: Axis) -> bool {
    if a == b {
        return false;
    }
    let live = |id: BodyId| world.get(id).is_some_and(|body: &Body| body.exists && body.solid);
    if !live(a) || !live(b) {
        return false;
    }
    let o1 = axis.of(world[a].displacement);
    let o2 = axis.of(world[b].displacement);
    // No relative motion along this axis
    if o1 == o2 {
        return false;
    }

    let bounds_a = world[a].broad_bounds();
    let bounds_b = world[b].broad_bounds();
    let ready_a = world[a].pre_collide(&bounds_b);
    let ready_b = world[b].pre_collide(&bounds_a);
    if !(ready_a && ready_b) {
        return false;
    }

    let a_low = first_is_low(o1, o2);
    let (low, high) = axis.sides();
    let side_a = if a_low { high } else { low };
    if !world[a].collide.contains(side_a) || !world[b].collide.contains(side_a.opposite()) {
        return false;
    }

    let (mut f1, mut f2) = (world[a].fixed, world[b].fixed);
    if f1 && f2 {
        f1 = o1 == 0.0 && axis.of(world[a].velocity) == 0.0;
        f2 = o2 == 0.0 && axis.of(world[b].velocity) == 0.0;
    }

    let ctx = PairCtx {
        a,
        b,
        axis,
        o1,
        o2,
        a_low,
        f1,
        f2,
        eps: world.cfg.rounding_error,
        limit: world.cfg.penetration_limit,
    };

    let offsets_a = world[a].offsets.clone();
    let offsets_b = world[b].offsets.clone();
    let mut hit = false;
    for &off1 in &offsets_a {
        world[a].hull_mut(axis).translate(off1);
        for &off2 in &offsets_b {
            world[b].hull_mut(axis).translate(off2);
            hit |= solve_offset_pair(world, &ctx);
            world[b].hull_mut(axis).translate(-off2);
        }
        world[a].hull_mut(axis).translate(-off1);
    }
    hit
}

/// Overlap, penetration, push and bookkeeping for one combination of
/// already translated hulls.
fn solve_offset_pair(world: &mut World, ctx: &PairCtx) -> bool {
    let PairCtx { a, b, axis, o1, o2, a_low, f1, f2, .. } = *ctx;
    let h1 = *world[a].hull(axis);
    let h2 = *world[b].hull(axis);
    if !h1.overlaps_eps(&h2, ctx.eps) {
        return false;
    }

    // Thickness of the other axis' hull along this axis; the part of the
    // swept hull trailing behind the body is not solid on the leading edge.
    let t1 = world[a].hull(axis.other()).extent(axis);
    let t2 = world[b].hull(axis.other()).extent(axis);
    let (p1, e1) = (h1.pos(axis), h1.extent(axis));
    let (p2, e2) = (h2.pos(axis), h2.extent(axis));

    let penetration = if a_low {
        let r1 = if o1 < 0.0 { p1 + t1 } else { p1 + e1 };
        let r2 = if o2 < 0.0 { p2 } else { p2 + e2 - t2 };
        r1 - r2
    } else {
        let r1 = if o2 < 0.0 { -p2 - t2 } else { -p2 - e2 };
        let r2 = if o1 < 0.0 { -p1 } else { -p1 - e1 + t1 };
        r1 - r2
    };

    if penetration == 0.0
        || (!f1 && penetration.abs() > e1 * ctx.limit)
        || (!f2 && penetration.abs() > e2 * ctx.limit)
    {
        return false;
    }

    let mut sv1 = axis.of(world[b].velocity);
    let mut sv2 = axis.of(world[a].velocity);
    let mut overlap = penetration;
    match (f1, f2) {
        (false, true) => world.translate(a, axis.vec(-overlap)),
        (true, false) => world.translate(b, axis.vec(overlap)),
        (false, false) => {
            overlap *= 0.5;
            world.translate(a, axis.vec(-overlap));
            world.translate(b, axis.vec(overlap));
            sv1 *= 0.5;
            sv2 *= 0.5;
        }
        (true, true) => {
            sv1 = 0.0;
            sv2 = 0.0;
        }
    }

    let (low, high) = axis.sides();
    let side_a = if a_low { high } else { low };
    let (fixed_a, fixed_b) = (world[a].fixed, world[b].fixed);
    world[a].hit(side_a, fixed_b, sv1);
    world[b].hit(side_a.opposite(), fixed_a, sv2);
    world.record_contact(Contact { axis, a, b, side: side_a, penetration });
    trace!(?a, ?b, ?axis, ?side_a, penetration, "resolved");

    if !f1 && overlap != 0.0 {
        let body = &mut world[a];
        let hull = body.hull_mut(axis);
        if a_low {
            *hull.extent_mut(axis) -= overlap;
        } else {
            *hull.pos_mut(axis) -= overlap;
            *hull.extent_mut(axis) += overlap;
        }
        if axis == Axis::X {
            body.hull_y.x -= overlap;
        }
        if axis == Axis::Y && a_low && f2 && world[b].moves {
            // Standing on a fixed platform: ride along with it
            let carried = world[b].displacement.x;
            ride(world, a, carried);
        }
    }
    if !f2 && overlap != 0.0 {
        let body = &mut world[b];
        let hull = body.hull_mut(axis);
        if a_low {
            *hull.pos_mut(axis) += overlap;
            *hull.extent_mut(axis) -= overlap;
        } else {
            *hull.extent_mut(axis) += overlap;
        }
        if axis == Axis::X {
            body.hull_y.x += overlap;
        }
        if axis == Axis::Y && !a_low && f1 && world[a].moves {
            let carried = world[a].displacement.x;
            ride(world, b, carried);
        }
    }
    true
}

fn ride(world: &mut World, id: BodyId, dx: f32) {
    if dx == 0.0 {
        return;
    }
    world.translate(id, Vec2::new(dx, 0.0));
    let body = &mut world[id];
    body.hull_x.x += dx;
    body.hull_y.x += dx;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use approx::assert_relative_eq;

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    /// Body that arrived at `pos` after moving by `disp` this tick.
    fn moved(pos: Vec2, size: Vec2, disp: Vec2, vel: Vec2) -> Body {
        let mut b = Body::new(pos, size).with_velocity(vel);
        b.displacement = disp;
        b.refresh_hulls();
        b
    }

    #[test]
    fn test_classification_tie_breaks() {
        assert!(first_is_low(0.0, -1.0));
        assert!(first_is_low(1.0, 0.0));
        assert!(first_is_low(1.0, -1.0));
        assert!(!first_is_low(-1.0, 1.0));
        assert!(!first_is_low(0.0, 1.0));
        // Same direction: the faster body is behind
        assert!(first_is_low(-1.0, -3.0));
        assert!(!first_is_low(-3.0, -1.0));
        assert!(first_is_low(3.0, 1.0));
        assert!(!first_is_low(1.0, 3.0));
    }

    #[test]
    fn test_equal_displacement_is_rejected_early() {
        let mut w = world();
        let a = w.add(moved(Vec2::ZERO, Vec2::splat(10.0), Vec2::new(2.0, 0.0), Vec2::ZERO));
        let b = w.add(moved(Vec2::new(5.0, 0.0), Vec2::splat(10.0), Vec2::new(2.0, 0.0), Vec2::ZERO));
        assert!(!solve_axis(&mut w, a, b, Axis::X));
        assert_eq!(w[a].position, Vec2::ZERO);
    }

    #[test]
    fn test_x_then_repeat_is_noop() {
        let mut w = world();
        let wall = w.add(Body::fixed(Vec2::ZERO, Vec2::splat(32.0)));
        let b = w.add(moved(Vec2::new(20.0, 0.0), Vec2::splat(32.0), Vec2::new(-5.0, 0.0), Vec2::new(-50.0, 0.0)));
        assert!(solve_axis(&mut w, wall, b, Axis::X));
        assert_relative_eq!(w[b].position.x, 32.0);
        let after = w[b].clone();
        assert!(!solve_axis(&mut w, wall, b, Axis::X));
        assert_eq!(w[b], after);
        assert_eq!(w.drain_contacts().len(), 1);
    }

    #[test]
    fn test_missing_dead_or_ghost_bodies_never_collide() {
        let mut w = world();
        let wall = w.add(Body::fixed(Vec2::ZERO, Vec2::splat(32.0)));
        let start = Vec2::new(20.0, 0.0);
        let runner = || moved(start, Vec2::splat(32.0), Vec2::new(-5.0, 0.0), Vec2::new(-50.0, 0.0));

        let dead = w.add(runner());
        w.kill(dead);
        assert!(!solve_axis(&mut w, wall, dead, Axis::X));
        assert_eq!(w[dead].position, start);

        assert!(!solve_axis(&mut w, wall, BodyId(99), Axis::X));
        assert!(!solve_axis(&mut w, BodyId(99), wall, Axis::Y));

        let mut ghost = runner();
        ghost.solid = false;
        let ghost = w.add(ghost);
        assert!(!solve_axis(&mut w, ghost, wall, Axis::X));
        assert_eq!(w[ghost].position, start);
        assert!(w.drain_contacts().is_empty());
    }

    #[test]
    fn test_penetration_over_limit_is_skipped() {
        let mut w = world();
        let wall = w.add(Body::fixed(Vec2::ZERO, Vec2::splat(32.0)));
        // 30 units deep into a 32+1 wide hull
        let b = w.add(moved(Vec2::new(2.0, 0.0), Vec2::splat(32.0), Vec2::new(-1.0, 0.0), Vec2::new(-10.0, 0.0)));
        assert!(!solve_axis(&mut w, wall, b, Axis::X));
        assert_eq!(w[b].position.x, 2.0);
    }

    #[test]
    fn test_both_fixed_moving_one_is_demoted() {
        let mut w = world();
        let wall = w.add(Body::fixed(Vec2::ZERO, Vec2::splat(32.0)));
        let mut pusher = moved(Vec2::new(28.0, 0.0), Vec2::splat(32.0), Vec2::new(-4.0, 0.0), Vec2::new(-40.0, 0.0));
        pusher.fixed = true;
        let p = w.add(pusher);
        assert!(solve_axis(&mut w, wall, p, Axis::X));
        assert_relative_eq!(w[p].position.x, 32.0);
        assert_eq!(w[wall].position, Vec2::ZERO);
        // Fixed body hitting a fixed wall while moving takes the wall's velocity
        assert_eq!(w[p].velocity.x, 0.0);
    }

    #[test]
    fn test_riding_a_moving_platform() {
        let mut w = world();
        let mut platform = Body::fixed(Vec2::new(0.0, 100.0), Vec2::new(64.0, 16.0));
        platform.velocity = Vec2::new(30.0, 0.0);
        platform.displacement = Vec2::new(3.0, 0.0);
        platform.refresh_hulls();
        let platform = w.add(platform);
        let rider = w.add(moved(Vec2::new(10.0, 90.0), Vec2::splat(16.0), Vec2::new(0.0, 6.0), Vec2::new(0.0, 60.0)));

        assert!(solve_axis(&mut w, rider, platform, Axis::Y));
        let r = &w[rider];
        assert_relative_eq!(r.position.y, 84.0);
        assert_relative_eq!(r.position.x, 13.0);
        assert!(r.on_floor);
        assert_eq!(r.velocity.y, 0.0);
    }
}
