use serde::{Deserialize, Serialize};

use crate::error::{PathfindingError, Result, ValidationErrors};
use crate::options::{AlgorithmKind, AlgorithmOptions};
use crate::solver::execute;
use crate::types::{AlgorithmResult, GridData, Position};

/// An engine invocation as it arrives over the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub algorithm: String,
    pub grid: GridData,
    pub start: Position,
    pub end: Position,
    #[serde(default)]
    pub options: AlgorithmOptions,
}

impl ExecutionRequest {
    pub fn from_json(json: &str) -> Result<ExecutionRequest> {
        Ok(serde_json::from_str(json)?)
    }
}

fn push(errors: &mut ValidationErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_owned())
        .or_default()
        .push(message.into());
}

fn check_position(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    p: &Position,
    grid: &GridData,
) {
    if p.x < 0 || p.x as usize >= grid.width {
        push(errors, field, format!("{label} x position is invalid"));
    }
    if p.y < 0 || p.y as usize >= grid.height {
        push(errors, field, format!("{label} y position is invalid"));
    }
}

/// Checks everything the engines take for granted and returns the parsed
/// algorithm. All problems are reported at once, keyed by request field.
pub fn validate_request(request: &ExecutionRequest) -> Result<AlgorithmKind> {
    let mut errors = ValidationErrors::new();

    let kind = request.algorithm.parse::<AlgorithmKind>().ok();
    if request.algorithm.is_empty() {
        push(&mut errors, "algorithm", "Algorithm is required");
    } else if kind.is_none() {
        push(
            &mut errors,
            "algorithm",
            format!("Invalid algorithm: {}", request.algorithm),
        );
    }

    let grid = &request.grid;
    if grid.width == 0 {
        push(&mut errors, "grid", "Grid width must be positive");
    }
    if grid.height == 0 {
        push(&mut errors, "grid", "Grid height must be positive");
    }
    let columns = grid.width.max(1);
    if grid.width.checked_mul(grid.height) != Some(grid.cells.len()) {
        push(&mut errors, "grid", "Grid cells length must match width * height");
    } else if grid
        .cells
        .iter()
        .enumerate()
        .any(|(ix, c)| c.x as usize != ix % columns || c.y as usize != ix / columns)
    {
        push(&mut errors, "grid", "Grid cells must be stored row-major");
    }

    check_position(&mut errors, "start", "Start", &request.start, grid);
    check_position(&mut errors, "end", "End", &request.end, grid);

    let weight = request.options.weight;
    if !weight.is_finite() || weight <= 0.0 {
        push(&mut errors, "options", "weight must be a positive number");
    }

    match kind {
        Some(kind) if errors.is_empty() => Ok(kind),
        _ => Err(PathfindingError::Validation(errors)),
    }
}

/// Validates `request` and runs the engine it names.
pub fn execute_request(request: &ExecutionRequest) -> Result<AlgorithmResult> {
    let kind = validate_request(request)?;
    Ok(execute(
        kind,
        &request.grid,
        request.start,
        request.end,
        &request.options,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::Heuristic;

    fn request(algorithm: &str) -> ExecutionRequest {
        let grid = GridData::new_open(6, 4);
        ExecutionRequest {
            algorithm: algorithm.to_owned(),
            start: grid.start_position,
            end: grid.end_position,
            grid,
            options: AlgorithmOptions::default(),
        }
    }

    fn field_errors(result: Result<AlgorithmKind>) -> ValidationErrors {
        match result {
            Err(PathfindingError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn accepts_valid_request() {
        for kind in AlgorithmKind::ALL {
            let req = request(kind.id());
            assert_eq!(validate_request(&req).unwrap(), kind);
            let result = execute_request(&req).unwrap();
            assert!(!result.path.is_empty());
        }
    }

    #[test]
    fn collects_errors_per_field() {
        let mut req = request("dijkstra");
        req.start = Position::new(-1, 2);
        req.end = Position::new(6, 4);
        req.options.weight = 0.0;
        req.grid.cells.pop();
        let errors = field_errors(validate_request(&req));
        assert_eq!(errors["algorithm"], vec!["Invalid algorithm: dijkstra"]);
        assert_eq!(errors["start"], vec!["Start x position is invalid"]);
        assert_eq!(errors["end"].len(), 2);
        assert_eq!(errors["grid"].len(), 1);
        assert_eq!(errors["options"].len(), 1);
        let message = PathfindingError::Validation(errors).to_string();
        assert!(message.contains("algorithm: Invalid algorithm: dijkstra"));
    }

    #[test]
    fn rejects_empty_grid() {
        let mut req = request("astar");
        req.grid = GridData {
            width: 0,
            height: 0,
            cells: Vec::new(),
            start_position: Position::default(),
            end_position: Position::default(),
        };
        let errors = field_errors(validate_request(&req));
        assert_eq!(errors["grid"].len(), 2);
        assert!(errors.contains_key("start"));
    }

    /// Dimensions whose product does not fit in a usize are a mismatch, not a panic.
    #[test]
    fn rejects_overflowing_dimensions() {
        let mut req = request("astar");
        req.grid = GridData {
            width: usize::MAX,
            height: 2,
            cells: Vec::new(),
            start_position: Position::default(),
            end_position: Position::default(),
        };
        req.start = Position::new(0, 0);
        req.end = Position::new(1, 1);
        let errors = field_errors(validate_request(&req));
        assert_eq!(
            errors["grid"],
            vec!["Grid cells length must match width * height"]
        );
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            execute_request(&req),
            Err(PathfindingError::Validation(_))
        ));
    }

    #[test]
    fn parses_json_with_partial_options() {
        let grid = GridData::new_open(3, 3);
        let json = serde_json::json!({
            "algorithm": "hpa",
            "grid": grid,
            "start": {"x": 0, "y": 0},
            "end": {"x": 2, "y": 2},
            "options": {"heuristic": "diagonal", "allowDiagonal": false}
        });
        let req = ExecutionRequest::from_json(&json.to_string()).unwrap();
        assert_eq!(req.options.heuristic, Heuristic::Diagonal);
        assert!(!req.options.allow_diagonal);
        assert_eq!(req.options.weight, 1.0);
        let result = execute_request(&req).unwrap();
        assert!(!result.path.is_empty());
        assert_eq!(result.metrics.path_length, result.path.len());
    }

    #[test]
    fn unknown_heuristic_is_a_parse_error() {
        let grid = GridData::new_open(2, 2);
        let json = serde_json::json!({
            "algorithm": "astar",
            "grid": grid,
            "start": {"x": 0, "y": 0},
            "end": {"x": 1, "y": 1},
            "options": {"heuristic": "chebyshev"}
        });
        assert!(matches!(
            ExecutionRequest::from_json(&json.to_string()),
            Err(PathfindingError::Json(_))
        ));
    }
}
