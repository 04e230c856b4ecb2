//! Quadrant partition used as the broad phase for `overlap` and `collide`.
//!
//! Built fresh for every dispatch and dropped (or handed back to the caller
//! for inspection) afterwards; it never outlives the bodies it indexes.

use crate::types::{BodyId, Rect, TreeStats};

/// Which of the two input sets a body was inserted from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListTag {
    A,
    B,
}

#[derive(Copy, Clone, Debug)]
struct Entry {
    id: BodyId,
    bounds: Rect,
}

#[derive(Clone, Debug)]
struct Node {
    bounds: Rect,
    depth: u32,
    a: Vec<Entry>,
    b: Vec<Entry>,
    /// NW, NE, SW, SE; created on first use.
    children: [Option<usize>; 4],
    /// Set once a second entry arrived; from then on entries are pushed down.
    split: bool,
}

impl Node {
    fn new(bounds: Rect, depth: u32) -> Self {
        Self { bounds, depth, a: Vec::new(), b: Vec::new(), children: [None; 4], split: false }
    }

    fn quadrant(&self, q: usize) -> Rect {
        let hw = self.bounds.width * 0.5;
        let hh = self.bounds.height * 0.5;
        let x = if q % 2 == 0 { self.bounds.x } else { self.bounds.x + hw };
        let y = if q < 2 { self.bounds.y } else { self.bounds.y + hh };
        Rect::new(x, y, hw, hh)
    }
}

/// Arena-backed quad tree over two tagged lists.
#[derive(Clone, Debug)]
pub struct QuadTree {
    nodes: Vec<Node>,
    max_divisions: u32,
    min_node_area: f32,
    eps: f32,
    candidate_pairs: usize,
}

impl QuadTree {
    /// Empty tree over `bounds`. Nodes stop subdividing at `max_divisions`
    /// levels, or once a child would be smaller than `min_node_size²`.
    pub fn new(bounds: Rect, max_divisions: u32, min_node_size: f32) -> Self {
        Self {
            nodes: vec![Node::new(bounds, 0)],
            max_divisions,
            min_node_area: min_node_size * min_node_size,
            eps: 0.0,
            candidate_pairs: 0,
        }
    }

    /// Tolerance of the bounds pre-filter applied before every callback.
    pub fn with_tolerance(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    pub fn bounds(&self) -> Rect {
        self.nodes[0].bounds
    }

    /// Register `id` with its broad-phase `bounds` in the `tag` list.
    ///
    /// A node only subdivides once it holds more than one entry, so a lone
    /// body stays as high up as it can. Bodies reaching outside the root
    /// bounds stay in the root node.
    pub fn insert(&mut self, id: BodyId, bounds: Rect, tag: ListTag) {
        let entry = Entry { id, bounds };
        if !self.nodes[0].bounds.contains_rect(&bounds) {
            self.push(0, entry, tag);
            return;
        }
        self.insert_at(0, entry, tag);
    }

    fn push(&mut self, node: usize, entry: Entry, tag: ListTag) {
        match tag {
            ListTag::A => self.nodes[node].a.push(entry),
            ListTag::B => self.nodes[node].b.push(entry),
        }
    }

    fn can_subdivide(&self, node: usize) -> bool {
        let n = &self.nodes[node];
        n.depth < self.max_divisions && n.bounds.area() * 0.25 >= self.min_node_area
    }

    fn child(&mut self, node: usize, q: usize) -> usize {
        if let Some(c) = self.nodes[node].children[q] {
            return c;
        }
        let bounds = self.nodes[node].quadrant(q);
        let depth = self.nodes[node].depth + 1;
        let idx = self.nodes.len();
        self.nodes.push(Node::new(bounds, depth));
        self.nodes[node].children[q] = Some(idx);
        idx
    }

    fn insert_at(&mut self, node: usize, entry: Entry, tag: ListTag) {
        if !self.can_subdivide(node) || entry.bounds.contains_rect(&self.nodes[node].bounds) {
            self.push(node, entry, tag);
            return;
        }
        if !self.nodes[node].split {
            let n = &self.nodes[node];
            if n.a.is_empty() && n.b.is_empty() {
                self.push(node, entry, tag);
                return;
            }
            self.split(node);
        }

        // Fits completely inside one quadrant
        for q in 0..4 {
            if self.nodes[node].quadrant(q).contains_rect(&entry.bounds) {
                let c = self.child(node, q);
                self.insert_at(c, entry, tag);
                return;
            }
        }

        // Straddles: register in every quadrant it reaches into
        let mut placed = false;
        for q in 0..4 {
            let r = self.nodes[node].quadrant(q);
            let reaches = entry.bounds.x < r.x + r.width
                && entry.bounds.x + entry.bounds.width > r.x
                && entry.bounds.y < r.y + r.height
                && entry.bounds.y + entry.bounds.height > r.y;
            if reaches {
                let c = self.child(node, q);
                self.insert_at(c, entry, tag);
                placed = true;
            }
        }
        if !placed {
            // Zero-extent bounds lying on a split line
            self.push(node, entry, tag);
        }
    }

    /// Push the entries parked in `node` down into its quadrants.
    fn split(&mut self, node: usize) {
        self.nodes[node].split = true;
        let a = std::mem::take(&mut self.nodes[node].a);
        let b = std::mem::take(&mut self.nodes[node].b);
        let root = self.nodes[0].bounds;
        let parked = a.into_iter().map(|e| (e, ListTag::A)).chain(b.into_iter().map(|e| (e, ListTag::B)));
        for (entry, tag) in parked {
            if node == 0 && !root.contains_rect(&entry.bounds) {
                self.push(0, entry, tag);
            } else {
                self.insert_at(node, entry, tag);
            }
        }
    }

    /// Call `f` for every candidate pair whose bounds overlap, A before B.
    ///
    /// With `same_set` only the A list is used and each member is paired with
    /// the members after it. A pair straddling several nodes may be offered
    /// once per shared node. Returns true if any call returned true.
    pub fn for_each_candidate_pair<F>(&mut self, same_set: bool, mut f: F) -> bool
    where
        F: FnMut(BodyId, BodyId) -> bool,
    {
        let mut anc_a = Vec::new();
        let mut anc_b = Vec::new();
        let mut tested = 0;
        let hit = self.visit(0, same_set, &mut anc_a, &mut anc_b, &mut tested, &mut f);
        self.candidate_pairs += tested;
        hit
    }

    fn visit<F>(
        &self,
        idx: usize,
        same_set: bool,
        anc_a: &mut Vec<Entry>,
        anc_b: &mut Vec<Entry>,
        tested: &mut usize,
        f: &mut F,
    ) -> bool
    where
        F: FnMut(BodyId, BodyId) -> bool,
    {
        let eps = self.eps;
        let mut test = |x: &Entry, y: &Entry| -> bool {
            if x.id == y.id || !x.bounds.overlaps_eps(&y.bounds, eps) {
                return false;
            }
            *tested += 1;
            f(x.id, y.id)
        };

        let node = &self.nodes[idx];
        let mut hit = false;
        if same_set {
            for (i, x) in node.a.iter().enumerate() {
                for y in &node.a[i + 1..] {
                    hit |= test(x, y);
                }
                for y in anc_a.iter() {
                    hit |= test(y, x);
                }
            }
        } else {
            for x in &node.a {
                for y in node.b.iter().chain(anc_b.iter()) {
                    hit |= test(x, y);
                }
            }
            for y in &node.b {
                for x in anc_a.iter() {
                    hit |= test(x, y);
                }
            }
        }

        let (la, lb) = (anc_a.len(), anc_b.len());
        anc_a.extend_from_slice(&node.a);
        if !same_set {
            anc_b.extend_from_slice(&node.b);
        }
        for c in node.children.iter().flatten() {
            hit |= self.visit(*c, same_set, anc_a, anc_b, tested, f);
        }
        anc_a.truncate(la);
        anc_b.truncate(lb);
        hit
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            nodes: self.nodes.len(),
            entries: self.nodes.iter().map(|n| n.a.len() + n.b.len()).sum(),
            max_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
            candidate_pairs: self.candidate_pairs,
        }
    }

    /// Bounds and depth of every node, for debug drawing.
    pub fn node_bounds(&self) -> impl Iterator<Item = (Rect, u32)> + '_ {
        self.nodes.iter().map(|n| (n.bounds, n.depth))
    }

    /// Number of nodes `id` is registered in.
    pub fn registrations(&self, id: BodyId) -> usize {
        self.nodes
            .iter()
            .map(|n| n.a.iter().chain(n.b.iter()).filter(|e| e.id == id).count())
            .sum()
    }
}
