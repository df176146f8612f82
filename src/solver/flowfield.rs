use std::collections::VecDeque;

use grid_util::{Point, SimpleValueGrid, ValueGrid};

use crate::options::{AlgorithmKind, AlgorithmOptions};
use crate::pathing_grid::PathingGrid;
use crate::search::interior;
use crate::solver::{GridSolver, Solution};
use crate::types::Metrics;
use crate::vector_field::{Vector, VectorField};

/// Estimated bytes per cell: one cost and one two-component direction.
const CELL_MEMORY_BYTES: usize = 12;

/// Neighbour scan order used when picking the steepest descent.
const DESCENT_ORDER: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Flow field towards a single goal. Movement is always 8-connected.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlowFieldSolver;

/// Goal-rooted cost field plus the unit direction each cell should move in.
/// One field can be traced from any number of starts.
#[derive(Clone, Debug)]
pub struct FlowField {
    pub goal: Point,
    costs: SimpleValueGrid<f64>,
    pub directions: VectorField<f64>,
    /// Number of cells taken off the wavefront queue.
    pub nodes_explored: usize,
}

/// Outcome of following a [FlowField] from a start cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    /// Start to goal inclusive, or `None` when the goal was not reached.
    pub route: Option<Vec<Point>>,
    /// Every cell stood on while tracing, in order.
    pub visited: Vec<Point>,
}

fn axis_step(v: f64) -> i32 {
    if v > f64::EPSILON {
        1
    } else if v < -f64::EPSILON {
        -1
    } else {
        0
    }
}

impl FlowField {
    /// Runs the wavefront from `goal` and derives the direction field.
    pub fn compute(grid: &PathingGrid, goal: Point) -> FlowField {
        let mut field = FlowField {
            goal,
            costs: SimpleValueGrid::new(grid.width(), grid.height(), f64::INFINITY),
            directions: VectorField::new(grid.width(), grid.height()),
            nodes_explored: 0,
        };
        field.propagate(grid);
        field.build_directions(grid);
        field
    }

    /// Cost of the cheapest 8-connected route from `p` to the goal; infinite
    /// for walls, unreachable cells and positions outside the grid.
    pub fn cost(&self, p: &Point) -> f64 {
        if self.costs.point_in_bounds(*p) {
            self.costs.get_point(*p)
        } else {
            f64::INFINITY
        }
    }

    pub fn width(&self) -> usize {
        self.costs.width()
    }

    pub fn height(&self) -> usize {
        self.costs.height()
    }

    pub fn direction(&self, p: &Point) -> Vector<f64> {
        self.directions.get(p.x, p.y)
    }

    fn propagate(&mut self, grid: &PathingGrid) {
        if !grid.can_move_to(self.goal) {
            return;
        }
        let goal = self.goal;
        let mut queue = VecDeque::new();
        self.costs.set_point(goal, 0.0);
        queue.push_back(goal);
        while let Some(current) = queue.pop_front() {
            self.nodes_explored += 1;
            let current_cost = self.cost(&current);
            for neighbor in grid.neighbors(&current, true) {
                let new_cost = current_cost + grid.cost(&current, &neighbor);
                if new_cost < self.cost(&neighbor) {
                    self.costs.set_point(neighbor, new_cost);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    /// Points every reached cell at its strictly cheapest neighbour. The first
    /// neighbour in [DESCENT_ORDER] wins ties; cells with no cheaper neighbour,
    /// the goal among them, keep a zero vector.
    fn build_directions(&mut self, grid: &PathingGrid) {
        for y in 0..self.height() as i32 {
            for x in 0..self.width() as i32 {
                let p = Point::new(x, y);
                let mut lowest = self.cost(&p);
                if !grid.can_move_to(p) || !lowest.is_finite() {
                    continue;
                }
                let mut best = None;
                for (dx, dy) in DESCENT_ORDER {
                    let n = Point::new(x + dx, y + dy);
                    if !grid.can_move_to(n) {
                        continue;
                    }
                    let cost = self.cost(&n);
                    if cost < lowest {
                        lowest = cost;
                        best = Some((dx, dy));
                    }
                }
                if let Some((dx, dy)) = best {
                    self.directions.set(x, y, Vector::new(dx as f64, dy as f64));
                }
            }
        }
        self.directions.normalize_all();
    }

    /// Follows the field from `start`, for at most `width * height` steps.
    pub fn trace(&self, grid: &PathingGrid, start: Point) -> Trace {
        let mut current = start;
        let mut previous: Option<Point> = None;
        let mut route = vec![start];
        let mut visited = Vec::new();
        for _ in 0..=self.width() * self.height() {
            visited.push(current);
            if current == self.goal {
                return Trace {
                    route: Some(route),
                    visited,
                };
            }
            let v = self.direction(&current);
            let (sx, sy) = (axis_step(v.x), axis_step(v.y));
            if sx == 0 && sy == 0 {
                break;
            }
            // Diagonal step first, then each axis on its own.
            let next = [(sx, sy), (sx, 0), (0, sy)]
                .into_iter()
                .filter(|&(dx, dy)| dx != 0 || dy != 0)
                .map(|(dx, dy)| Point::new(current.x + dx, current.y + dy))
                .find(|n| grid.can_move_to(*n));
            let Some(next) = next else {
                break;
            };
            if previous == Some(next) {
                break;
            }
            previous = Some(current);
            current = next;
            route.push(current);
        }
        Trace {
            route: None,
            visited,
        }
    }
}

impl GridSolver for FlowFieldSolver {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Flowfield
    }

    fn solve(
        &self,
        grid: &PathingGrid,
        start: Point,
        end: Point,
        _options: &AlgorithmOptions,
    ) -> Solution {
        let memory_used = grid.width() * grid.height() * CELL_MEMORY_BYTES;
        if start == end {
            return Solution {
                path: Vec::new(),
                visited: vec![start],
                metrics: Metrics {
                    nodes_explored: 1,
                    memory_used,
                    ..Metrics::default()
                },
            };
        }
        let field = FlowField::compute(grid, end);
        let trace = field.trace(grid, start);
        Solution {
            path: trace.route.as_deref().map(interior).unwrap_or_default(),
            visited: trace.visited,
            metrics: Metrics {
                nodes_explored: field.nodes_explored,
                memory_used,
                ..Metrics::default()
            },
        }
    }
}
