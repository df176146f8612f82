//! # grid_pathfinding_lab
//!
//! Five grid pathfinding engines behind one call:
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm),
//! [Jump Point Search](https://en.wikipedia.org/wiki/Jump_point_search),
//! bidirectional [Theta*](https://en.wikipedia.org/wiki/Theta*),
//! flow fields and
//! [HPA*](https://webdocs.cs.ualberta.ca/~mmueller/ps/hpastar.pdf).
//!
//! Every engine takes a [GridData] description, a start, an end and
//! [AlgorithmOptions] and returns an [AlgorithmResult] with the path, the
//! exploration trace and some metrics, so that their behaviour can be compared
//! side by side. Engines copy the grid on entry and keep no state between
//! calls.
//!
//! ```
//! use grid_pathfinding_lab::{execute, AlgorithmKind, AlgorithmOptions, GridData, Position};
//!
//! let grid = GridData::new_open(5, 5);
//! let options = AlgorithmOptions::default().with_diagonal(false);
//! let result = execute(
//!     AlgorithmKind::Astar,
//!     &grid,
//!     Position::new(0, 2),
//!     Position::new(4, 2),
//!     &options,
//! );
//! assert_eq!(result.metrics.path_length, 3);
//! ```
pub mod error;
pub mod heuristic;
pub mod metrics;
pub mod options;
pub mod pathing_grid;
pub mod priority_queue;
pub mod search;
pub mod solver;
pub mod types;
pub mod validation;
pub mod vector_field;

pub use grid_util::Point;

pub use crate::error::{PathfindingError, Result};
pub use crate::heuristic::Heuristic;
pub use crate::metrics::{AlgorithmStats, MetricsStore};
pub use crate::options::{AlgorithmInfo, AlgorithmKind, AlgorithmOptions};
pub use crate::pathing_grid::PathingGrid;
pub use crate::solver::{execute, solver_for, GridSolver, Solution};
pub use crate::types::{AlgorithmResult, CellKind, GridCell, GridData, Metrics, Position};
pub use crate::validation::{execute_request, validate_request, ExecutionRequest};

pub const N_SMALLVEC_SIZE: usize = 8;
/// Scale of the cross-product term added to `h` when tie-breaking is on.
pub const TIE_BREAKER_SCALE: f64 = 0.001;
/// Estimated bytes per open or closed node in the grid searches.
pub const NODE_MEMORY_BYTES: usize = 40;

/// Turns waypoints into a path on the grid which can be followed step by step. Due to symmetry this
/// is typically one of many ways to follow the waypoints.
pub fn waypoints_to_path(waypoints: &[Point]) -> Vec<Point> {
    let Some((&first, rest)) = waypoints.split_first() else {
        return Vec::new();
    };
    let mut current = first;
    let mut path = vec![current];
    for next in rest {
        while current != *next {
            current = current + current.dir_obj(next);
            path.push(current);
        }
    }
    path
}
