//! Building blocks shared by the best-first searches: a node arena whose
//! insertion index stands in for parent pointers, the open-list ranking and a
//! few result helpers.
use std::cmp::Ordering;
use std::time::Instant;

use fxhash::FxBuildHasher;
use grid_util::Point;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;

use crate::NODE_MEMORY_BYTES;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// A search node. `parent` is the arena index of the node it was reached from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathNode {
    pub position: Point,
    pub g: f64,
    pub h: f64,
    pub f: f64,
    pub parent: Option<usize>,
}

impl PathNode {
    fn unreached(position: Point) -> PathNode {
        PathNode {
            position,
            g: f64::INFINITY,
            h: 0.0,
            f: f64::INFINITY,
            parent: None,
        }
    }

    pub fn set(&mut self, g: f64, h: f64, parent: Option<usize>) {
        self.g = g;
        self.h = h;
        self.f = g + h;
        self.parent = parent;
    }
}

/// Owns every node of one search, keyed by coordinate.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: FxIndexMap<Point, PathNode>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    /// Inserts the root of the search tree with `g = 0`.
    pub fn insert_root(&mut self, position: Point, h: f64) -> usize {
        let ix = self.get_or_insert(position);
        self.nodes[ix].set(0.0, h, None);
        ix
    }

    /// Index of the node at `position`, creating an unreached one if needed.
    pub fn get_or_insert(&mut self, position: Point) -> usize {
        match self.nodes.entry(position) {
            Occupied(e) => e.index(),
            Vacant(e) => {
                let ix = e.index();
                e.insert(PathNode::unreached(position));
                ix
            }
        }
    }

    pub fn index_of(&self, position: &Point) -> Option<usize> {
        self.nodes.get_index_of(position)
    }

    pub fn get(&self, position: &Point) -> Option<&PathNode> {
        self.nodes.get(position)
    }

    pub fn node(&self, ix: usize) -> &PathNode {
        &self.nodes[ix]
    }

    pub fn node_mut(&mut self, ix: usize) -> &mut PathNode {
        &mut self.nodes[ix]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Points from the root to node `ix`, following parent indices.
    pub fn route_to(&self, ix: usize) -> Vec<Point> {
        let mut route: Vec<Point> =
            std::iter::successors(Some(ix), |&i| self.nodes[i].parent)
                .map(|i| self.nodes[i].position)
                .collect();
        route.reverse();
        route
    }
}

/// Open-list key. Orders by estimated cost first and, for equal estimates,
/// puts the node with the larger cost so far (the deeper one) first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rank {
    pub estimated_cost: f64,
    pub cost: f64,
}

impl Rank {
    pub fn of(node: &PathNode) -> Rank {
        Rank {
            estimated_cost: node.f,
            cost: node.g,
        }
    }
}

impl Eq for Rank {}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.estimated_cost.total_cmp(&other.estimated_cost) {
            Ordering::Equal => other.cost.total_cmp(&self.cost),
            s => s,
        }
    }
}

/// Drops the first and last cell of a start-to-goal route.
pub fn interior(route: &[Point]) -> Vec<Point> {
    if route.len() <= 2 {
        Vec::new()
    } else {
        route[1..route.len() - 1].to_vec()
    }
}

/// Byte estimate for a search holding `open + closed` nodes.
pub fn node_memory(open: usize, closed: usize) -> usize {
    (open + closed) * NODE_MEMORY_BYTES
}

pub fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_prefers_lower_estimate_then_deeper_node() {
        let a = Rank {
            estimated_cost: 4.0,
            cost: 1.0,
        };
        let b = Rank {
            estimated_cost: 5.0,
            cost: 3.0,
        };
        let c = Rank {
            estimated_cost: 4.0,
            cost: 2.0,
        };
        assert!(a < b);
        assert!(c < a);
    }

    #[test]
    fn arena_routes_follow_parents() {
        let mut arena = NodeArena::new();
        let root = arena.insert_root(Point::new(0, 0), 2.0);
        let a = arena.get_or_insert(Point::new(1, 0));
        arena.node_mut(a).set(1.0, 1.0, Some(root));
        let b = arena.get_or_insert(Point::new(2, 0));
        arena.node_mut(b).set(2.0, 0.0, Some(a));
        assert_eq!(arena.get_or_insert(Point::new(1, 0)), a);
        assert_eq!(arena.len(), 3);
        assert_eq!(
            arena.route_to(b),
            vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)]
        );
        assert_eq!(arena.node(b).f, 2.0);
        assert!(arena.get(&Point::new(5, 5)).is_none());
    }

    #[test]
    fn interior_drops_endpoints() {
        let route = [Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)];
        assert_eq!(interior(&route), vec![Point::new(1, 0)]);
        assert!(interior(&route[..2]).is_empty());
        assert!(interior(&route[..1]).is_empty());
    }
}
