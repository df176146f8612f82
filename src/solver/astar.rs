use fxhash::FxHashSet;
use grid_util::{Point, SimpleValueGrid, ValueGrid};

use crate::heuristic::tie_breaker;
use crate::options::{AlgorithmKind, AlgorithmOptions};
use crate::pathing_grid::PathingGrid;
use crate::priority_queue::IndexedPriorityQueue;
use crate::search::{interior, node_memory, NodeArena, Rank};
use crate::solver::{GridSolver, Solution};
use crate::types::Metrics;

/// Plain weighted A* over the 4- or 8-connected grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct AstarSolver;

/// Raw result of [grid_astar], before the endpoint-free path convention is applied.
#[derive(Clone, Debug, Default)]
pub(crate) struct SearchOutcome {
    /// Start to goal inclusive.
    pub route: Option<Vec<Point>>,
    pub visited: Vec<Point>,
    pub nodes_explored: usize,
    pub open_len: usize,
    pub closed_len: usize,
}

/// Weighted A* from `start` to `goal`. When a `region` mask is given, cells
/// where it is `false` are never generated; both endpoints are expected to lie
/// inside it.
pub(crate) fn grid_astar(
    grid: &PathingGrid,
    start: Point,
    goal: Point,
    options: &AlgorithmOptions,
    region: Option<&SimpleValueGrid<bool>>,
) -> SearchOutcome {
    let heuristic = |p: &Point| {
        let h = options.heuristic.distance(p, &goal) * options.weight;
        if options.tie_breaker {
            h + tie_breaker(p, &start, &goal)
        } else {
            h
        }
    };
    let in_region = |p: &Point| region.map_or(true, |r| r.get_point(*p));

    let mut arena = NodeArena::new();
    let mut open = IndexedPriorityQueue::new();
    let mut closed: FxHashSet<Point> = FxHashSet::default();
    let mut outcome = SearchOutcome::default();

    let root = arena.insert_root(start, heuristic(&start));
    open.push_or_update(root, Rank::of(arena.node(root)));
    while let Some((ix, _)) = open.pop() {
        let current = *arena.node(ix);
        outcome.visited.push(current.position);
        outcome.nodes_explored += 1;
        if current.position == goal {
            outcome.route = Some(arena.route_to(ix));
            break;
        }
        closed.insert(current.position);
        for neighbor in grid.neighbors(&current.position, options.allow_diagonal) {
            if closed.contains(&neighbor) || !in_region(&neighbor) {
                continue;
            }
            let tentative_g = current.g + grid.cost(&current.position, &neighbor);
            let nix = arena.get_or_insert(neighbor);
            if tentative_g < arena.node(nix).g {
                arena
                    .node_mut(nix)
                    .set(tentative_g, heuristic(&neighbor), Some(ix));
                open.push_or_update(nix, Rank::of(arena.node(nix)));
            }
        }
    }
    outcome.open_len = open.len();
    outcome.closed_len = closed.len();
    outcome
}

impl GridSolver for AstarSolver {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Astar
    }

    fn solve(
        &self,
        grid: &PathingGrid,
        start: Point,
        end: Point,
        options: &AlgorithmOptions,
    ) -> Solution {
        let outcome = grid_astar(grid, start, end, options, None);
        Solution {
            path: outcome.route.as_deref().map(interior).unwrap_or_default(),
            metrics: Metrics {
                nodes_explored: outcome.nodes_explored,
                memory_used: node_memory(outcome.open_len, outcome.closed_len),
                ..Metrics::default()
            },
            visited: outcome.visited,
        }
    }
}
