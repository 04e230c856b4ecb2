use std::ops::{Index, IndexMut};

use glam::Vec2;
use tracing::{debug, instrument, warn};

use crate::api::CollisionWorldApi;
use crate::body::Body;
use crate::config::{validate_bounds, WorldConfig};
use crate::error::ConfigError;
use crate::motion;
use crate::quadtree::{ListTag, QuadTree};
use crate::resolve;
use crate::tilemap::TileGrid;
use crate::types::*;

/// Callback for [`World::overlap`]. Returning true counts the pair as a hit.
pub type OverlapCallback<'a> = &'a mut dyn FnMut(&mut World, BodyId, BodyId) -> bool;

/// Arena of bodies plus the per-call broad phase and resolver.
#[derive(Clone, Debug)]
pub struct World {
    pub cfg: WorldConfig,
    bodies: Vec<Body>,
    contacts: Vec<Contact>,
}

impl CollisionWorldApi for World {
    fn new(cfg: WorldConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg, bodies: Vec::new(), contacts: Vec::new() })
    }

    fn set_world_bounds(&mut self, bounds: Rect, divisions: u32) -> Result<(), ConfigError> {
        if let Err(e) = validate_bounds(&bounds) {
            warn!(?bounds, "rejected world bounds");
            return Err(e);
        }
        self.cfg.bounds = bounds;
        if divisions > 0 {
            self.cfg.max_divisions = divisions;
        }
        debug!(?bounds, divisions = self.cfg.max_divisions, "world bounds set");
        Ok(())
    }

    fn add(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(body);
        id
    }

    fn add_tilemap(&mut self, origin: Vec2, grid: TileGrid) -> BodyId {
        self.add(Body::tilemap(origin, grid))
    }

    fn add_group(&mut self, members: &[BodyId]) -> BodyId {
        let group = self.add(Body::group());
        for &m in members {
            self.add_member(group, m);
        }
        group
    }

    fn add_member(&mut self, group: BodyId, member: BodyId) -> bool {
        if !self.accepts_member(group, member) {
            return false;
        }
        self[group].members.push(member);
        true
    }

    fn remove_member(&mut self, group: BodyId, member: BodyId) -> bool {
        let Some(body) = self.get_mut(group) else {
            warn!(?group, "unknown body id");
            return false;
        };
        let Some(slot) = body.members.iter().position(|&m| m == member) else {
            return false;
        };
        body.members.remove(slot);
        debug!(?group, ?member, "member removed");
        true
    }

    fn replace_member(&mut self, group: BodyId, old: BodyId, new: BodyId) -> bool {
        let Some(slot) = self.get(group).and_then(|g| g.members.iter().position(|&m| m == old)) else {
            return false;
        };
        if old == new {
            return true;
        }
        if !self.accepts_member(group, new) {
            return false;
        }
        self[group].members[slot] = new;
        true
    }

    fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.index())
    }

    fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.index())
    }

    fn step(&mut self, dt: f32) {
        let mut carried = Vec::new();
        for (i, body) in self.bodies.iter_mut().enumerate() {
            if !body.exists {
                continue;
            }
            let before = body.position;
            motion::integrate(body, dt);
            let delta = body.position - before;
            if body.is_composite() && delta != Vec2::ZERO {
                carried.push((BodyId(i as u32), delta));
            }
        }
        for (group, delta) in carried {
            self.carry_members(group, delta);
        }
    }

    fn reset(&mut self, id: BodyId, position: Vec2) {
        let Some(body) = self.get_mut(id) else {
            warn!(?id, "unknown body id");
            return;
        };
        let delta = position - body.position;
        body.position = position;
        body.exists = true;
        if delta != Vec2::ZERO {
            self.carry_members(id, delta);
        }
    }

    fn translate(&mut self, id: BodyId, delta: Vec2) {
        let Some(body) = self.get_mut(id) else {
            warn!(?id, "unknown body id");
            return;
        };
        body.position += delta;
        self.carry_members(id, delta);
    }

    fn kill(&mut self, id: BodyId) {
        let Some(body) = self.get_mut(id) else {
            warn!(?id, "unknown body id");
            return;
        };
        body.kill();
        let members = body.members.clone();
        for m in members {
            self.kill(m);
        }
    }

    fn overlap(&mut self, a: &[BodyId], b: &[BodyId], callback: Option<OverlapCallback<'_>>) -> bool {
        self.overlap_with_tree(a, b, callback).0
    }

    fn collide(&mut self, a: &[BodyId], b: &[BodyId]) -> bool {
        self.collide_with_tree(a, b).0
    }

    fn drain_contacts(&mut self) -> Vec<Contact> {
        std::mem::take(&mut self.contacts)
    }
}

impl World {
    /// Panics on an unknown id; see [`CollisionWorldApi::get`].
    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.index()]
    }

    pub fn body_mut(&mut self, id: BodyId) -> &mut Body {
        &mut self.bodies[id.index()]
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &Body)> + '_ {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i as u32), b))
    }

    /// Contacts recorded since the last drain.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub(crate) fn record_contact(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    /// [`CollisionWorldApi::overlap`], also handing back the partition tree
    /// that was built for the call.
    #[instrument(skip_all, fields(a = a.len(), b = b.len()))]
    pub fn overlap_with_tree(
        &mut self,
        a: &[BodyId],
        b: &[BodyId],
        callback: Option<OverlapCallback<'_>>,
    ) -> (bool, QuadTree) {
        let Some((mut tree, same_set)) = self.build_tree(a, b, false) else {
            return (false, self.empty_tree());
        };
        let hit = match callback {
            Some(cb) => self.dispatch_overlap(&mut tree, same_set, cb),
            None => self.dispatch_overlap(&mut tree, same_set, &mut |w, x, y| {
                w.kill(x);
                w.kill(y);
                true
            }),
        };
        debug!(nodes = tree.stats().nodes, hit, "overlap");
        (hit, tree)
    }

    /// [`CollisionWorldApi::collide`], also handing back the partition tree.
    ///
    /// Both passes walk the same tree; bodies moved by the X pass keep the
    /// registrations made before it.
    #[instrument(skip_all, fields(a = a.len(), b = b.len()))]
    pub fn collide_with_tree(&mut self, a: &[BodyId], b: &[BodyId]) -> (bool, QuadTree) {
        let Some((mut tree, same_set)) = self.build_tree(a, b, true) else {
            return (false, self.empty_tree());
        };
        let cx = tree.for_each_candidate_pair(same_set, |x, y| resolve::solve_axis(self, x, y, Axis::X));
        let cy = tree.for_each_candidate_pair(same_set, |x, y| resolve::solve_axis(self, x, y, Axis::Y));
        debug!(nodes = tree.stats().nodes, cx, cy, "collide");
        (cx || cy, tree)
    }

    fn dispatch_overlap(&mut self, tree: &mut QuadTree, same_set: bool, callback: OverlapCallback<'_>) -> bool {
        tree.for_each_candidate_pair(same_set, |x, y| {
            if !self.precise_overlap(x, y) {
                return false;
            }
            callback(self, x, y)
        })
    }

    fn empty_tree(&self) -> QuadTree {
        QuadTree::new(self.cfg.bounds, self.cfg.max_divisions, self.cfg.min_node_size)
            .with_tolerance(self.cfg.rounding_error)
    }

    /// Insert both sets; `None` when either contributes nothing.
    fn build_tree(&self, a: &[BodyId], b: &[BodyId], solid_only: bool) -> Option<(QuadTree, bool)> {
        let same_set = a == b;
        let mut tree = self.empty_tree();
        let na = self.insert_all(&mut tree, a, ListTag::A, solid_only);
        if na == 0 {
            return None;
        }
        if !same_set && self.insert_all(&mut tree, b, ListTag::B, solid_only) == 0 {
            return None;
        }
        debug!(inserted = tree.stats().entries, same_set, "built partition");
        Some((tree, same_set))
    }

    fn insert_all(&self, tree: &mut QuadTree, ids: &[BodyId], tag: ListTag, solid_only: bool) -> usize {
        ids.iter().map(|&id| self.insert_flat(tree, id, tag, solid_only)).sum()
    }

    /// Non-solid composites are replaced by their members.
    fn insert_flat(&self, tree: &mut QuadTree, id: BodyId, tag: ListTag, solid_only: bool) -> usize {
        let Some(body) = self.get(id) else {
            warn!(?id, "unknown body id");
            return 0;
        };
        if !body.exists {
            return 0;
        }
        if body.is_composite() && !body.solid {
            return self.insert_all(tree, &body.members, tag, solid_only);
        }
        if solid_only && !body.solid {
            return 0;
        }
        tree.insert(id, body.broad_bounds(), tag);
        1
    }

    /// Tile-accurate overlap in both directions.
    fn precise_overlap(&self, x: BodyId, y: BodyId) -> bool {
        let (bx, by) = (&self[x], &self[y]);
        bx.exists && by.exists && bx.overlaps(&by.rect()) && by.overlaps(&bx.rect())
    }

    /// Move the members of `id` along with it, widening their hulls and
    /// displacement so the resolver sees the whole sweep.
    fn carry_members(&mut self, id: BodyId, delta: Vec2) {
        let members = self[id].members.clone();
        for m in members {
            let body = &mut self[m];
            if !body.exists {
                continue;
            }
            body.position += delta;
            if body.solid {
                body.displacement += delta;
                body.hull_x.width += delta.x.abs();
                if delta.x < 0.0 {
                    body.hull_x.x += delta.x;
                }
                body.hull_y.x += delta.x;
                body.hull_y.height += delta.y.abs();
                if delta.y < 0.0 {
                    body.hull_y.y += delta.y;
                }
            }
            self.carry_members(m, delta);
        }
    }

    /// Whether `member` may join `group`: both known, not already in it, and
    /// no membership cycle.
    fn accepts_member(&self, group: BodyId, member: BodyId) -> bool {
        if self.get(group).is_none() || self.get(member).is_none() {
            warn!(?group, ?member, "unknown body id");
            return false;
        }
        // A body may not (transitively) contain itself
        if group == member || self.contains_member(member, group) {
            warn!(?group, ?member, "member would form a cycle");
            return false;
        }
        !self[group].members.contains(&member)
    }

    /// True if `target` is reachable through the members of `root`.
    fn contains_member(&self, root: BodyId, target: BodyId) -> bool {
        self[root]
            .members
            .iter()
            .any(|&m| m == target || self.contains_member(m, target))
    }
}

impl Index<BodyId> for World {
    type Output = Body;

    fn index(&self, id: BodyId) -> &Body {
        &self.bodies[id.index()]
    }
}

impl IndexMut<BodyId> for World {
    fn index_mut(&mut self, id: BodyId) -> &mut Body {
        &mut self.bodies[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let cfg = WorldConfig::with_bounds(Rect::new(0.0, 0.0, -1.0, 10.0), 3);
        assert!(matches!(World::new(cfg), Err(ConfigError::InvalidBounds { .. })));
    }

    #[test]
    fn test_set_world_bounds_keeps_divisions_on_zero() {
        let mut w = world();
        w.set_world_bounds(Rect::new(0.0, 0.0, 640.0, 480.0), 0).unwrap();
        assert_eq!(w.cfg.max_divisions, 3);
        w.set_world_bounds(Rect::new(0.0, 0.0, 640.0, 480.0), 5).unwrap();
        assert_eq!(w.cfg.max_divisions, 5);
        assert!(w.set_world_bounds(Rect::new(0.0, 0.0, 0.0, 480.0), 2).is_err());
        assert_eq!(w.cfg.bounds, Rect::new(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn test_group_members_follow_group_motion() {
        let mut w = world();
        let m = w.add(Body::new(Vec2::new(10.0, 10.0), Vec2::splat(4.0)));
        let g = w.add_group(&[m]);
        w[g].velocity = Vec2::new(8.0, 0.0);
        w.step(0.5);
        assert_eq!(w[g].position, Vec2::new(4.0, 0.0));
        let member = &w[m];
        assert_eq!(member.position, Vec2::new(14.0, 10.0));
        assert_eq!(member.displacement, Vec2::new(4.0, 0.0));
        // Hull covers the carried sweep
        assert_eq!(member.hull_x, Rect::new(10.0, 10.0, 8.0, 4.0));
        assert_eq!(member.hull_y.x, 14.0);
    }

    #[test]
    fn test_reset_and_kill_cascade() {
        let mut w = world();
        let m = w.add(Body::new(Vec2::new(1.0, 1.0), Vec2::ONE));
        let inner = w.add_group(&[m]);
        let outer = w.add_group(&[inner]);
        w.reset(outer, Vec2::new(5.0, 5.0));
        assert_eq!(w[inner].position, Vec2::new(5.0, 5.0));
        assert_eq!(w[m].position, Vec2::new(6.0, 6.0));

        w.kill(outer);
        assert!(!w[m].exists && !w[inner].exists);
        // Only the reset body revives; dead members stay put
        w.reset(outer, Vec2::ZERO);
        assert!(w[outer].exists && !w[inner].exists);
        assert_eq!(w[m].position, Vec2::new(6.0, 6.0));
    }

    #[test]
    fn test_add_member_rejects_cycles_and_unknown_ids() {
        let mut w = world();
        let a = w.add_group(&[]);
        let b = w.add_group(&[]);
        assert!(w.add_member(a, b));
        assert!(!w.add_member(b, a));
        assert!(!w.add_member(a, a));
        assert!(!w.add_member(a, BodyId(99)));
        assert!(!w.add_member(a, b));
    }

    #[test]
    fn test_remove_and_replace_members() {
        let mut w = world();
        let [m1, m2, m3] = [0.0, 10.0, 20.0].map(|x| w.add(Body::new(Vec2::new(x, 0.0), Vec2::ONE)));
        let g = w.add_group(&[m1, m2]);

        assert!(w.replace_member(g, m1, m3));
        assert_eq!(w[g].members, vec![m3, m2]);
        assert!(!w.replace_member(g, m1, m3));
        // Would duplicate m2 or make the group contain itself
        assert!(!w.replace_member(g, m3, m2));
        assert!(!w.replace_member(g, m3, g));
        assert!(!w.replace_member(BodyId(99), m3, m1));

        assert!(w.remove_member(g, m3));
        assert!(!w.remove_member(g, m3));
        assert!(!w.remove_member(BodyId(99), m2));
        assert_eq!(w[g].members, vec![m2]);
        assert!(w[m3].exists);

        // Removed members no longer follow the group
        w.translate(g, Vec2::new(0.0, 5.0));
        assert_eq!(w[m2].position, Vec2::new(10.0, 5.0));
        assert_eq!(w[m3].position, Vec2::new(20.0, 0.0));
    }

    #[test]
    fn test_emptied_group_is_not_a_body() {
        let mut w = world();
        let crate_box = w.add(Body::new(Vec2::ZERO, Vec2::splat(10.0)));
        let m = w.add(Body::new(Vec2::new(100.0, 100.0), Vec2::ONE));
        let g = w.add_group(&[m]);
        assert!(w.remove_member(g, m));
        // The group sits at the origin under the box, but has nothing to offer
        assert!(!w.overlap(&[crate_box], &[g], None));
        assert!(w[crate_box].exists && w[g].exists);
    }

    #[test]
    fn test_overlap_default_kills_both() {
        let mut w = world();
        let a = w.add(Body::new(Vec2::ZERO, Vec2::splat(10.0)));
        let b = w.add(Body::new(Vec2::new(5.0, 5.0), Vec2::splat(10.0)));
        let c = w.add(Body::new(Vec2::new(50.0, 50.0), Vec2::splat(10.0)));
        assert!(w.overlap(&[a], &[b, c], None));
        assert!(!w[a].exists && !w[b].exists);
        assert!(w[c].exists);
        // Dead bodies never pair again
        assert!(!w.overlap(&[a], &[b], None));
    }

    #[test]
    fn test_overlap_with_callback_and_group_flattening() {
        let mut w = world();
        let p = w.add(Body::new(Vec2::ZERO, Vec2::splat(10.0)));
        let e1 = w.add(Body::new(Vec2::new(5.0, 0.0), Vec2::splat(10.0)));
        let e2 = w.add(Body::new(Vec2::new(300.0, 0.0), Vec2::splat(10.0)));
        let enemies = w.add_group(&[e1, e2]);
        let mut seen = Vec::new();
        let mut cb = |_: &mut World, x: BodyId, y: BodyId| {
            seen.push((x, y));
            true
        };
        assert!(w.overlap(&[p], &[enemies], Some(&mut cb)));
        seen.dedup();
        assert_eq!(seen, vec![(p, e1)]);
        assert!(w[p].exists);
    }

    #[test]
    fn test_collide_skips_non_solid_and_missing() {
        let mut w = world();
        let wall = w.add(Body::fixed(Vec2::ZERO, Vec2::splat(32.0)));
        let mut ghost = Body::new(Vec2::new(20.0, 0.0), Vec2::splat(32.0));
        ghost.solid = false;
        ghost.displacement = Vec2::new(-5.0, 0.0);
        let ghost = w.add(ghost);
        assert!(!w.collide(&[wall], &[ghost]));
        assert!(!w.collide(&[], &[wall]));
        assert!(!w.collide(&[wall], &[BodyId(42)]));
        assert_eq!(w[ghost].position.x, 20.0);
    }

    #[test]
    fn test_collide_with_tree_returns_partition() {
        let mut w = world();
        let wall = w.add(Body::fixed(Vec2::ZERO, Vec2::splat(32.0)));
        let mut b = Body::new(Vec2::new(20.0, 0.0), Vec2::splat(32.0)).with_velocity(Vec2::new(-50.0, 0.0));
        b.displacement = Vec2::new(-5.0, 0.0);
        b.refresh_hulls();
        let b = w.add(b);
        let (hit, tree) = w.collide_with_tree(&[wall], &[b]);
        assert!(hit);
        assert_eq!(tree.bounds(), w.cfg.bounds);
        assert!(tree.stats().candidate_pairs >= 2);
        assert_relative_eq!(w[b].position.x, 32.0);
        let contacts = w.drain_contacts();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].side, Side::Right);
        assert!(w.drain_contacts().is_empty());
    }
}
