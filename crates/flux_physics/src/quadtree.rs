//! Spatial index over particle circles.
//!
//! The tree is rebuilt from scratch every tick and is read-only once built.
//! Each entry is a circle (position + radius). An entry lives in the deepest
//! node whose region contains its whole circle along the split lines, so a
//! particle straddling a seam stays in the parent instead of being lost to
//! one side. Every node also keeps the bounds of all circles below it
//! (`extent`) and queries prune on that, which makes them conservative:
//! a query never misses an entry whose circle touches the query shape.

use flux_core::{Aabb, ParticleId, ParticleStore};
use glam::Vec2;
use tracing::trace;

/// A particle circle as seen by the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub id: ParticleId,
    pub position: Vec2,
    pub radius: f32,
}

impl Entry {
    fn bounds(&self) -> Aabb {
        Aabb::around_circle(self.position, self.radius)
    }
}

#[derive(Debug, Clone)]
struct Node {
    region: Aabb,
    /// Bounds of every circle stored in this subtree, `None` when empty
    extent: Option<Aabb>,
    depth: u32,
    /// Leaf contents, or the straddlers of an internal node
    entries: Vec<Entry>,
    children: Option<[usize; 4]>,
}

/// Shape and occupancy figures for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: u32,
    pub max_leaf_occupancy: usize,
    pub entries: usize,
}

#[derive(Debug, Clone)]
pub struct QuadTree {
    nodes: Vec<Node>,
    max_depth: u32,
    leaf_capacity: usize,
    max_radius: f32,
    len: usize,
}

impl QuadTree {
    /// Build over the live particles of `store`.
    ///
    /// The root covers `bounds` grown to include every particle position,
    /// so nothing is dropped when particles leave the world.
    pub fn build(store: &ParticleStore, bounds: Aabb, max_depth: u32, leaf_capacity: usize) -> Self {
        let entries = store
            .iter()
            .map(|p| Entry {
                id: p.id,
                position: p.position,
                radius: p.radius,
            })
            .collect();
        Self::from_entries(entries, bounds, max_depth, leaf_capacity)
    }

    pub fn from_entries(entries: Vec<Entry>, bounds: Aabb, max_depth: u32, leaf_capacity: usize) -> Self {
        let root = Aabb::from_points(entries.iter().map(|e| e.position))
            .map_or(bounds, |b| b.union(&bounds));
        let mut tree = Self {
            nodes: Vec::new(),
            max_depth,
            leaf_capacity: leaf_capacity.max(1),
            max_radius: entries.iter().map(|e| e.radius).fold(0.0, f32::max),
            len: entries.len(),
        };
        tree.build_node(root, entries, 0);
        trace!(stats = ?tree.stats(), "quadtree built");
        tree
    }

    fn build_node(&mut self, region: Aabb, entries: Vec<Entry>, depth: u32) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            region,
            extent: None,
            depth,
            entries: Vec::new(),
            children: None,
        });

        if entries.len() <= self.leaf_capacity || depth >= self.max_depth || all_coincident(&entries) {
            self.nodes[index].extent = extent_of(&entries);
            self.nodes[index].entries = entries;
            return index;
        }

        let center = region.center();
        let total = entries.len();
        let mut stay = Vec::new();
        let mut buckets: [Vec<Entry>; 4] = Default::default();
        for entry in entries {
            if straddles(&entry, center) {
                stay.push(entry);
            } else {
                buckets[region.quadrant_of(entry.position)].push(entry);
            }
        }

        // Splitting that pushes nothing down cannot reduce occupancy.
        if stay.len() == total {
            self.nodes[index].extent = extent_of(&stay);
            self.nodes[index].entries = stay;
            return index;
        }

        let quadrants = region.quadrants();
        let mut children = [0usize; 4];
        for (q, bucket) in buckets.into_iter().enumerate() {
            children[q] = self.build_node(quadrants[q], bucket, depth + 1);
        }

        let extent = children
            .iter()
            .filter_map(|&c| self.nodes[c].extent)
            .chain(extent_of(&stay))
            .reduce(|a, b| a.union(&b));
        let node = &mut self.nodes[index];
        node.extent = extent;
        node.entries = stay;
        node.children = Some(children);
        index
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest radius among indexed entries.
    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    /// Region covered by the root node.
    pub fn root_region(&self) -> Aabb {
        self.nodes[0].region
    }

    /// Visit every entry whose circle may intersect the closed disk
    /// `(center, radius)`.
    pub fn for_each_in_radius(&self, center: Vec2, radius: f32, mut f: impl FnMut(&Entry)) {
        self.visit(
            |extent| extent.intersects_circle(center, radius),
            |entry| {
                let reach = radius + entry.radius;
                entry.position.distance_squared(center) <= reach * reach
            },
            &mut f,
        );
    }

    /// Ids of every entry whose circle may intersect the disk.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<ParticleId> {
        let mut out = Vec::new();
        self.for_each_in_radius(center, radius, |e| out.push(e.id));
        out
    }

    /// Ids of every entry whose circle may intersect `region`.
    pub fn query_region(&self, region: &Aabb) -> Vec<ParticleId> {
        let mut out = Vec::new();
        self.visit(
            |extent| extent.intersects(region),
            |entry| region.intersects_circle(entry.position, entry.radius),
            &mut |e: &Entry| out.push(e.id),
        );
        out
    }

    fn visit(
        &self,
        node_hit: impl Fn(&Aabb) -> bool,
        entry_hit: impl Fn(&Entry) -> bool,
        f: &mut impl FnMut(&Entry),
    ) {
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            match node.extent {
                Some(extent) if node_hit(&extent) => {}
                _ => continue,
            }
            for entry in node.entries.iter().filter(|e| entry_hit(e)) {
                f(entry);
            }
            if let Some(children) = node.children {
                stack.extend(children.iter().rev());
            }
        }
    }

    /// Largest distance any indexed particle has moved since the build.
    /// Removed particles are ignored.
    pub fn max_drift(&self, store: &ParticleStore) -> f32 {
        self.nodes
            .iter()
            .flat_map(|n| n.entries.iter())
            .filter_map(|e| store.get(e.id).ok().map(|p| p.position.distance(e.position)))
            .fold(0.0, f32::max)
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            nodes: self.nodes.len(),
            entries: self.len,
            ..TreeStats::default()
        };
        for node in &self.nodes {
            stats.max_depth = stats.max_depth.max(node.depth);
            if node.children.is_none() {
                stats.leaves += 1;
                stats.max_leaf_occupancy = stats.max_leaf_occupancy.max(node.entries.len());
            }
        }
        stats
    }

    pub fn depth_limit(&self) -> u32 {
        self.max_depth
    }
}

/// Whether the circle crosses either split line through `center`.
fn straddles(entry: &Entry, center: Vec2) -> bool {
    let b = entry.bounds();
    (b.min.x < center.x && b.max.x > center.x) || (b.min.y < center.y && b.max.y > center.y)
}

fn all_coincident(entries: &[Entry]) -> bool {
    match entries.split_first() {
        Some((first, rest)) => rest.iter().all(|e| e.position == first.position),
        None => true,
    }
}

fn extent_of(entries: &[Entry]) -> Option<Aabb> {
    entries.iter().map(Entry::bounds).reduce(|a, b| a.union(&b))
}
