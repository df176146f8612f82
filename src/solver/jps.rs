use fxhash::FxHashSet;
use grid_util::{Direction, Point, SimpleValueGrid, ValueGrid};
use log::debug;
use smallvec::SmallVec;

use crate::heuristic::{euclidean_distance, tie_breaker};
use crate::options::{AlgorithmKind, AlgorithmOptions};
use crate::pathing_grid::PathingGrid;
use crate::priority_queue::IndexedPriorityQueue;
use crate::search::{interior, node_memory, NodeArena, Rank};
use crate::solver::{GridSolver, Solution};
use crate::types::Metrics;
use crate::{waypoints_to_path, N_SMALLVEC_SIZE};

/// Jump Point Search. Always moves on the 8-connected grid, whatever
/// [AlgorithmOptions::allow_diagonal] says.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpsSolver;

/// The [Direction] whose [num](Direction::num) is `d`.
fn direction_of(d: i32) -> Direction {
    let origin = Point::new(0, 0);
    origin.dir_obj(&origin.moore_neighbor(d))
}

/// Per-cell bitmasks computed before a search. Bit `d` of `neighbours` is set
/// when the neighbour in [Direction] `d` is walkable; bit `d` of `forced` is set
/// when arriving at the cell while travelling in direction `d` reveals a
/// forced neighbour. Cells outside the grid count as blocked.
#[derive(Clone, Debug)]
pub struct JumpTable {
    neighbours: SimpleValueGrid<u8>,
    forced: SimpleValueGrid<u8>,
}

impl JumpTable {
    pub fn new(grid: &PathingGrid) -> JumpTable {
        let mut table = JumpTable {
            neighbours: SimpleValueGrid::new(grid.width(), grid.height(), 0),
            forced: SimpleValueGrid::new(grid.width(), grid.height(), 0),
        };
        for y in 0..grid.height() as i32 {
            for x in 0..grid.width() as i32 {
                let p = Point::new(x, y);
                let mask = (0..8)
                    .filter(|d| grid.can_move_to(p.moore_neighbor(*d)))
                    .fold(0u8, |mask, d| mask | 1 << d);
                table.neighbours.set_point(p, mask);
            }
        }
        for y in 0..grid.height() as i32 {
            for x in 0..grid.width() as i32 {
                let p = Point::new(x, y);
                let mask = table.forced_mask(&p);
                table.forced.set_point(p, mask);
            }
        }
        table
    }

    /// The neighbour indexing used here corresponds to that used in [grid_util::Direction].
    pub fn indexed_neighbor(&self, node: &Point, index: i32) -> bool {
        (self.neighbours.get_point(*node) & 1 << index.rem_euclid(8)) != 0
    }

    pub fn is_forced(&self, dir: Direction, node: &Point) -> bool {
        self.forced.get_point(*node) & (1 << dir.num()) != 0
    }

    fn forced_mask(&self, node: &Point) -> u8 {
        let n = |i: i32| self.indexed_neighbor(node, i);
        let mut forced_mask: u8 = 0;
        for dir_num in 0..8 {
            let forced = if dir_num % 2 == 1 {
                (!n(dir_num + 3) && n(dir_num + 2)) || (!n(dir_num + 5) && n(dir_num + 6))
            } else {
                (!n(dir_num + 2) && n(dir_num + 1)) || (!n(dir_num + 6) && n(dir_num + 7))
            };
            if forced {
                forced_mask |= 1 << dir_num;
            }
        }
        forced_mask
    }

    /// Natural neighbours in the direction of travel plus the forced ones.
    pub fn pruned_neighborhood(
        &self,
        dir: Direction,
        node: &Point,
    ) -> SmallVec<[Direction; N_SMALLVEC_SIZE]> {
        let dir_num = dir.num();
        let mut n_mask: u8;
        if dir.diagonal() {
            n_mask = 0b10000011_u8.rotate_left(dir_num as u32);
            if !self.indexed_neighbor(node, 3 + dir_num) {
                n_mask |= 1 << ((dir_num + 2) % 8);
            }
            if !self.indexed_neighbor(node, 5 + dir_num) {
                n_mask |= 1 << ((dir_num + 6) % 8);
            }
        } else {
            n_mask = 1 << dir_num;
            if !self.indexed_neighbor(node, 2 + dir_num) {
                n_mask |= 1 << ((dir_num + 1) % 8);
            }
            if !self.indexed_neighbor(node, 6 + dir_num) {
                n_mask |= 1 << ((dir_num + 7) % 8);
            }
        }
        let comb_mask = self.neighbours.get_point(*node) & n_mask;
        (0..8)
            .filter(|d| comb_mask & (1 << *d) != 0)
            .map(direction_of)
            .collect()
    }

    /// Straight jump in a cardinal direction, only used to look ahead for jump points.
    fn jump_straight(
        &self,
        grid: &PathingGrid,
        mut current: Point,
        direction: Direction,
        goal: &Point,
    ) -> Option<Point> {
        debug_assert!(!direction.diagonal());
        loop {
            current = current + direction;
            if !grid.can_move_to(current) {
                return None;
            }
            if current == *goal || self.is_forced(direction, &current) {
                return Some(current);
            }
        }
    }

    /// Walks from `initial` in `direction` until the goal, a forced cell or (for
    /// diagonals) a cell from which a straight look-ahead finds one. Scanned cells
    /// are appended to `visited`.
    pub fn jump(
        &self,
        grid: &PathingGrid,
        mut current: Point,
        direction: Direction,
        goal: &Point,
        visited: &mut Vec<Point>,
    ) -> Option<Point> {
        loop {
            current = current + direction;
            if !grid.can_move_to(current) {
                return None;
            }
            visited.push(current);
            if current == *goal || self.is_forced(direction, &current) {
                return Some(current);
            }
            if direction.diagonal()
                && (self
                    .jump_straight(grid, current, direction.x_dir(), goal)
                    .is_some()
                    || self
                        .jump_straight(grid, current, direction.y_dir(), goal)
                        .is_some())
            {
                return Some(current);
            }
        }
    }
}

impl GridSolver for JpsSolver {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Jps
    }

    fn solve(
        &self,
        grid: &PathingGrid,
        start: Point,
        end: Point,
        options: &AlgorithmOptions,
    ) -> Solution {
        if !options.allow_diagonal {
            debug!("jps: ignoring allowDiagonal=false, jumps are always 8-connected");
        }
        let table = JumpTable::new(grid);
        let heuristic = |p: &Point| {
            let h = options.heuristic.distance(p, &end) * options.weight;
            if options.tie_breaker {
                h + tie_breaker(p, &start, &end)
            } else {
                h
            }
        };

        let mut arena = NodeArena::new();
        let mut open = IndexedPriorityQueue::new();
        let mut closed: FxHashSet<Point> = FxHashSet::default();
        let mut visited = Vec::new();
        let mut nodes_explored = 0;
        let mut route = None;

        let root = arena.insert_root(start, heuristic(&start));
        open.push_or_update(root, Rank::of(arena.node(root)));
        while let Some((ix, _)) = open.pop() {
            let current = *arena.node(ix);
            visited.push(current.position);
            nodes_explored += 1;
            if current.position == end {
                route = Some(waypoints_to_path(&arena.route_to(ix)));
                break;
            }
            closed.insert(current.position);

            let parent = current.parent.map(|p| arena.node(p).position);
            let directions: SmallVec<[Direction; N_SMALLVEC_SIZE]> = match parent {
                Some(p) => {
                    table.pruned_neighborhood(p.dir_obj(&current.position), &current.position)
                }
                // For the starting node, jump in every direction.
                None => (0..8).map(direction_of).collect(),
            };
            for dir in directions {
                let Some(jump_point) =
                    table.jump(grid, current.position, dir, &end, &mut visited)
                else {
                    continue;
                };
                if closed.contains(&jump_point) {
                    continue;
                }
                let tentative_g = current.g + euclidean_distance(&current.position, &jump_point);
                let nix = arena.get_or_insert(jump_point);
                if tentative_g < arena.node(nix).g {
                    arena
                        .node_mut(nix)
                        .set(tentative_g, heuristic(&jump_point), Some(ix));
                    open.push_or_update(nix, Rank::of(arena.node(nix)));
                }
            }
        }

        Solution {
            path: route.as_deref().map(interior).unwrap_or_default(),
            visited,
            metrics: Metrics {
                nodes_explored,
                memory_used: node_memory(open.len(), closed.len()),
                ..Metrics::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::Heuristic;
    use crate::solver::AstarSolver;
    use crate::types::{GridData, Position};

    fn targets(from: Point, dirs: &[Direction]) -> Vec<Point> {
        dirs.iter().map(|d| from + *d).collect()
    }

    fn options() -> AlgorithmOptions {
        AlgorithmOptions::for_algorithm(AlgorithmKind::Jps).with_tie_breaker(false)
    }

    /// Asserts that the case in which start and goal are equal is handled correctly.
    #[test]
    fn equal_start_goal() {
        let data = GridData::new_open(1, 1);
        let start = Position::new(0, 0);
        let result = JpsSolver.execute(&data, start, start, &options());
        assert!(result.path.is_empty());
        assert_eq!(result.metrics.nodes_explored, 1);
    }

    /// A blocked cell next to a straight jump forces the cell beside it.
    #[test]
    fn forced_neighbours() {
        // |.....|
        // |..#..|
        // |.....|
        let data = GridData::from_ascii(&[".....", "..#..", "....."]);
        let grid = PathingGrid::new(&data);
        let table = JumpTable::new(&grid);
        // Travelling east along y = 0, the wall below (2, 1) opens up (3, 1).
        let east = Point::new(0, 0).dir_obj(&Point::new(1, 0));
        assert!(table.is_forced(east, &Point::new(2, 0)));
        assert!(!table.is_forced(east, &Point::new(1, 0)));
        let pruned = table.pruned_neighborhood(east, &Point::new(2, 0));
        let reached = targets(Point::new(2, 0), &pruned);
        assert_eq!(reached.len(), 2);
        assert!(reached.contains(&Point::new(3, 0)));
        assert!(reached.contains(&Point::new(3, 1)));
        // Borders do not force anything on an open row.
        assert!(!table.is_forced(east, &Point::new(1, 2)));
    }

    #[test]
    fn diagonal_pruning_keeps_natural_neighbours() {
        let data = GridData::new_open(3, 3);
        let grid = PathingGrid::new(&data);
        let table = JumpTable::new(&grid);
        let centre = Point::new(1, 1);
        let north_east = centre.dir_obj(&Point::new(2, 0));
        let reached = targets(centre, &table.pruned_neighborhood(north_east, &centre));
        assert_eq!(reached.len(), 3);
        for p in [(1, 0), (2, 0), (2, 1)] {
            assert!(reached.contains(&Point::new(p.0, p.1)), "{:?}", reached);
        }
    }

    /// On an open row the goal is reached with a single jump.
    #[test]
    fn open_row_is_one_jump() {
        let data = GridData::new_open(7, 7);
        let start = Position::new(0, 3);
        let end = Position::new(6, 3);
        let result = JpsSolver.execute(&data, start, end, &options());
        assert_eq!(result.metrics.nodes_explored, 2);
        assert_eq!(result.path.len(), 5);
        assert!(result.path.iter().all(|p| p.y == 3));
    }

    /// JPS finds paths of the same cost as A* while expanding fewer nodes.
    #[test]
    fn matches_astar_cost() {
        // |S....#....|
        // |.##..#..#.|
        // |..#.....#.|
        // |..#..##.#E|
        let data = GridData::from_ascii(&[
            "S....#....",
            ".##..#..#.",
            "..#.....#.",
            "..#..##.#E",
        ]);
        let start = data.start_position;
        let end = data.end_position;
        let options = options().with_heuristic(Heuristic::Euclidean);
        let jps = JpsSolver.execute(&data, start, end, &options);
        let astar = AstarSolver.execute(&data, start, end, &options);
        assert!(!jps.path.is_empty());
        assert!((jps.route_cost(start, end) - astar.route_cost(start, end)).abs() < 1e-9);
        assert!(jps.metrics.nodes_explored <= astar.metrics.nodes_explored);
        let route = jps.route(start, end);
        assert!(route.windows(2).all(|w| w[0].is_adjacent(&w[1])));
        assert!(route.iter().all(|p| data.cell(*p).map_or(false, |c| c.walkable)));
    }

    #[test]
    fn walled_off_goal() {
        let data = GridData::from_ascii(&["S.#..", "..#..", "..#.E"]);
        let result = JpsSolver.execute(&data, data.start_position, data.end_position, &options());
        assert!(result.path.is_empty());
        assert!(result.metrics.nodes_explored >= 1);
    }
}
