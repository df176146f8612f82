use fxhash::FxHashSet;
use grid_util::Point;

use crate::heuristic::{euclidean_distance, tie_breaker};
use crate::options::{AlgorithmKind, AlgorithmOptions};
use crate::pathing_grid::PathingGrid;
use crate::priority_queue::IndexedPriorityQueue;
use crate::search::{interior, node_memory, NodeArena, Rank};
use crate::solver::{GridSolver, Solution};
use crate::types::Metrics;

/// Any-angle Theta* run from both ends at once. The returned path holds the
/// turning points of the any-angle route, so consecutive points need not be
/// adjacent but always have line of sight.
#[derive(Clone, Copy, Debug, Default)]
pub struct BidirectionalThetaSolver;

/// One direction of the search: rooted at `origin`, heading for `target`.
struct Frontier {
    arena: NodeArena,
    open: IndexedPriorityQueue<Rank>,
    closed: FxHashSet<Point>,
    target: Point,
}

impl Frontier {
    fn new(origin: Point, target: Point, h: f64) -> Frontier {
        let mut arena = NodeArena::new();
        let mut open = IndexedPriorityQueue::new();
        let root = arena.insert_root(origin, h);
        open.push_or_update(root, Rank::of(arena.node(root)));
        Frontier {
            arena,
            open,
            closed: FxHashSet::default(),
            target,
        }
    }

    fn min_f(&self) -> f64 {
        self.open
            .peek()
            .map_or(f64::INFINITY, |(_, rank)| rank.estimated_cost)
    }

    /// Cost so far at `p`, if this side has reached it.
    fn cost_to(&self, p: &Point) -> Option<f64> {
        self.arena.get(p).map(|n| n.g).filter(|g| g.is_finite())
    }
}

/// Best meeting found so far.
#[derive(Clone, Copy, Debug)]
struct Meeting {
    position: Point,
    cost: f64,
}

struct Search<'a> {
    grid: &'a PathingGrid,
    options: &'a AlgorithmOptions,
    start: Point,
    end: Point,
    visited: Vec<Point>,
    nodes_explored: usize,
    best: Option<Meeting>,
}

impl Search<'_> {
    fn heuristic(&self, p: &Point, target: &Point) -> f64 {
        let h = self.options.heuristic.distance(p, target) * self.options.weight;
        if self.options.tie_breaker {
            h + tie_breaker(p, &self.start, &self.end)
        } else {
            h
        }
    }

    fn best_cost(&self) -> f64 {
        self.best.map_or(f64::INFINITY, |m| m.cost)
    }

    /// Pops one node from `side`, records a meeting with `other` if there is
    /// one and relaxes the node's neighbours with the Theta* rule.
    fn expand(&mut self, side: &mut Frontier, other: &Frontier) {
        let Some((ix, _)) = side.open.pop() else {
            return;
        };
        let current = *side.arena.node(ix);
        self.visited.push(current.position);
        self.nodes_explored += 1;
        side.closed.insert(current.position);

        if let Some(other_g) = other.cost_to(&current.position) {
            let cost = current.g + other_g;
            if cost < self.best_cost() {
                self.best = Some(Meeting {
                    position: current.position,
                    cost,
                });
            }
        }

        let grandparent = current.parent.map(|p| (p, *side.arena.node(p)));
        for neighbor in self
            .grid
            .neighbors(&current.position, self.options.allow_diagonal)
        {
            if side.closed.contains(&neighbor) {
                continue;
            }
            let (g, parent) = match grandparent {
                Some((pix, p)) if self.grid.has_line_of_sight(&p.position, &neighbor) => {
                    (p.g + euclidean_distance(&p.position, &neighbor), pix)
                }
                _ => (
                    current.g + euclidean_distance(&current.position, &neighbor),
                    ix,
                ),
            };
            let nix = side.arena.get_or_insert(neighbor);
            if g < side.arena.node(nix).g {
                let h = self.heuristic(&neighbor, &side.target);
                side.arena.node_mut(nix).set(g, h, Some(parent));
                side.open.push_or_update(nix, Rank::of(side.arena.node(nix)));
            }
        }
    }

    /// Search is over once no pair of frontier nodes can beat the best meeting.
    fn exhausted(&self, forward: &Frontier, backward: &Frontier) -> bool {
        forward.min_f() + backward.min_f() >= self.best_cost()
    }
}

impl GridSolver for BidirectionalThetaSolver {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Bts
    }

    fn solve(
        &self,
        grid: &PathingGrid,
        start: Point,
        end: Point,
        options: &AlgorithmOptions,
    ) -> Solution {
        let mut search = Search {
            grid,
            options,
            start,
            end,
            visited: Vec::new(),
            nodes_explored: 0,
            best: None,
        };
        let mut forward = Frontier::new(start, end, search.heuristic(&start, &end));
        let mut backward = Frontier::new(end, start, search.heuristic(&end, &start));

        'search: loop {
            if search.exhausted(&forward, &backward) {
                break 'search;
            }
            search.expand(&mut forward, &backward);
            if search.exhausted(&forward, &backward) {
                break 'search;
            }
            search.expand(&mut backward, &forward);
        }

        let route = search.best.and_then(|meeting| {
            let f_ix = forward.arena.index_of(&meeting.position)?;
            let b_ix = backward.arena.index_of(&meeting.position)?;
            let mut route = forward.arena.route_to(f_ix);
            let mut tail = backward.arena.route_to(b_ix);
            tail.reverse();
            route.extend(tail.into_iter().skip(1));
            Some(route)
        });

        Solution {
            path: route.as_deref().map(interior).unwrap_or_default(),
            visited: search.visited,
            metrics: Metrics {
                nodes_explored: search.nodes_explored,
                memory_used: node_memory(
                    forward.open.len() + backward.open.len(),
                    forward.closed.len() + backward.closed.len(),
                ),
                ..Metrics::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::Heuristic;
    use crate::types::{GridData, Position};

    fn walkable_route(grid: &PathingGrid, route: &[Position]) -> bool {
        let route: Vec<Point> = route.iter().map(|p| Point::from(*p)).collect();
        route.iter().all(|p| grid.can_move_to(*p))
            && route.windows(2).all(|w| grid.has_line_of_sight(&w[0], &w[1]))
    }

    fn options() -> AlgorithmOptions {
        AlgorithmOptions::for_algorithm(AlgorithmKind::Bts)
    }

    #[test]
    fn equal_start_goal() {
        let data = GridData::new_open(3, 3);
        let p = Position::new(1, 1);
        let result = BidirectionalThetaSolver.execute(&data, p, p, &options());
        assert!(result.path.is_empty());
        assert_eq!(result.metrics.path_length, 0);
        assert_eq!(result.metrics.nodes_explored, 1);
    }

    #[test]
    fn straight_row_costs_its_length() {
        let data = GridData::new_open(7, 7);
        let start = Position::new(0, 3);
        let end = Position::new(6, 3);
        let options = options()
            .with_heuristic(Heuristic::Euclidean)
            .with_tie_breaker(false);
        let result = BidirectionalThetaSolver.execute(&data, start, end, &options);
        assert!((result.route_cost(start, end) - 6.0).abs() < 1e-9);
        assert!(result.path.iter().all(|p| p.y == 3));
    }

    /// On an open grid the route cuts across instead of following 45 degree steps.
    #[test]
    fn any_angle_shortcut() {
        let data = GridData::new_open(7, 7);
        let start = Position::new(0, 0);
        let end = Position::new(6, 3);
        let result = BidirectionalThetaSolver.execute(&data, start, end, &options());
        let grid = PathingGrid::new(&data);
        assert!(walkable_route(&grid, &result.route(start, end)));
        let octile = 3.0 * std::f64::consts::SQRT_2 + 3.0;
        let cost = result.route_cost(start, end);
        assert!(cost < octile);
        assert!(cost >= start.euclidean_distance(&end) - 1e-9);
    }

    #[test]
    fn routes_around_walls() {
        // |.....|
        // |S.#.E|
        // |..#..|
        // |..#..|
        let data = GridData::from_ascii(&[".....", "S.#.E", "..#..", "..#.."]);
        let start = data.start_position;
        let end = data.end_position;
        let result = BidirectionalThetaSolver.execute(&data, start, end, &options());
        assert!(!result.path.is_empty());
        let grid = PathingGrid::new(&data);
        assert!(walkable_route(&grid, &result.route(start, end)));
    }

    #[test]
    fn separated_halves() {
        let data = GridData::from_ascii(&["S.#..", "..#..", "..#.E"]);
        let result = BidirectionalThetaSolver.execute(
            &data,
            data.start_position,
            data.end_position,
            &options(),
        );
        assert!(result.path.is_empty());
        assert!(result.metrics.nodes_explored > 0);
        assert!(!result.visited.is_empty());
    }
}
