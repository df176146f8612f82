use std::time::Instant;

use grid_util::Point;
use log::debug;

use crate::options::{AlgorithmKind, AlgorithmOptions};
use crate::pathing_grid::PathingGrid;
use crate::search::elapsed_ms;
use crate::types::{AlgorithmResult, GridData, Metrics, Position};

pub mod astar;
pub mod flowfield;
pub mod hpa;
pub mod jps;
pub mod theta;

pub use astar::AstarSolver;
pub use flowfield::{FlowField, FlowFieldSolver};
pub use hpa::HpaSolver;
pub use jps::JpsSolver;
pub use theta::BidirectionalThetaSolver;

/// What an engine produces, still in grid coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Solution {
    /// Cells strictly between start and end.
    pub path: Vec<Point>,
    pub visited: Vec<Point>,
    pub metrics: Metrics,
}

impl From<Solution> for AlgorithmResult {
    fn from(solution: Solution) -> AlgorithmResult {
        AlgorithmResult {
            path: solution.path.into_iter().map(Position::from).collect(),
            visited: solution.visited.into_iter().map(Position::from).collect(),
            metrics: solution.metrics,
        }
    }
}

/// Common interface of the engines.
///
/// [solve](Self::solve) fills in everything but the wall-clock time;
/// [execute](Self::execute) wraps it with a private grid copy, timing and logging.
pub trait GridSolver {
    fn kind(&self) -> AlgorithmKind;

    fn solve(
        &self,
        grid: &PathingGrid,
        start: Point,
        end: Point,
        options: &AlgorithmOptions,
    ) -> Solution;

    fn execute(
        &self,
        data: &GridData,
        start: Position,
        end: Position,
        options: &AlgorithmOptions,
    ) -> AlgorithmResult {
        debug!(
            "{}: searching {}x{} grid from {} to {}",
            self.kind(),
            data.width,
            data.height,
            start,
            end
        );
        let started = Instant::now();
        let grid = PathingGrid::new(data);
        let solution = self.solve(&grid, start.into(), end.into(), options);
        let mut result = AlgorithmResult::from(solution);
        result.metrics.execution_time_ms = elapsed_ms(started);
        result.metrics.path_length = result.path.len();
        debug!(
            "{}: path of {} cells, {} nodes explored in {:.3} ms",
            self.kind(),
            result.metrics.path_length,
            result.metrics.nodes_explored,
            result.metrics.execution_time_ms
        );
        result
    }
}

pub fn solver_for(kind: AlgorithmKind) -> Box<dyn GridSolver> {
    match kind {
        AlgorithmKind::Astar => Box::new(AstarSolver),
        AlgorithmKind::Jps => Box::new(JpsSolver),
        AlgorithmKind::Bts => Box::new(BidirectionalThetaSolver),
        AlgorithmKind::Flowfield => Box::new(FlowFieldSolver),
        AlgorithmKind::Hpa => Box::new(HpaSolver),
    }
}

/// Runs one engine. Never fails: an unreachable end yields an empty path.
pub fn execute(
    kind: AlgorithmKind,
    grid: &GridData,
    start: Position,
    end: Position,
    options: &AlgorithmOptions,
) -> AlgorithmResult {
    solver_for(kind).execute(grid, start, end, options)
}
