use core::fmt;

use grid_util::Point;
use serde::{Deserialize, Serialize};

/// A grid coordinate as it appears on the wire. `y` grows downwards. The
/// engines work on [Point] and convert at the [execute](crate::execute) boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Position {
        Position { x, y }
    }

    /// Straight-line distance to `other`.
    pub fn euclidean_distance(&self, other: &Position) -> f64 {
        crate::heuristic::euclidean_distance(&Point::from(*self), &Point::from(*other))
    }

    pub fn manhattan_distance(&self, other: &Position) -> i32 {
        Point::from(*self).manhattan_distance(&Point::from(*other)) as i32
    }

    /// True for the 8 cells surrounding `self`.
    pub fn is_adjacent(&self, other: &Position) -> bool {
        Point::from(*self).move_distance(&Point::from(*other)) == 1
    }
}

impl From<Point> for Position {
    fn from(p: Point) -> Position {
        Position::new(p.x, p.y)
    }
}

impl From<Position> for Point {
    fn from(p: Position) -> Point {
        Point::new(p.x, p.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Presentation tag of a cell. Searches only ever consult [GridCell::walkable].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    #[default]
    Empty,
    Wall,
    Start,
    End,
    Visited,
    Visiting,
    Path,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: CellKind,
    pub cost: f64,
    pub walkable: bool,
}

impl GridCell {
    pub fn empty(x: i32, y: i32) -> GridCell {
        GridCell {
            x,
            y,
            kind: CellKind::Empty,
            cost: 1.0,
            walkable: true,
        }
    }
}

/// Caller-owned grid description. Cells are stored row-major, so the cell for
/// `(x, y)` lives at `y * width + x`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridData {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<GridCell>,
    pub start_position: Position,
    pub end_position: Position,
}

impl GridData {
    /// A wall-free grid with the start a quarter of the way in and the end three
    /// quarters of the way in, both on the middle row.
    pub fn new_open(width: usize, height: usize) -> GridData {
        let cells = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| GridCell::empty(x, y)))
            .collect();
        let mut grid = GridData {
            width,
            height,
            cells,
            start_position: Position::default(),
            end_position: Position::default(),
        };
        let start = Position::new((width / 4) as i32, (height / 2) as i32);
        let end = Position::new((width * 3 / 4) as i32, (height / 2) as i32);
        grid.set_endpoints(start, end);
        grid
    }

    /// Parses rows of `.` (empty), `#` (wall), `S` (start) and `E` (end).
    /// Any other character is treated as an empty cell. Without an `S` or `E`
    /// the [new_open](Self::new_open) placement is kept, and that cell is made
    /// walkable even if it was drawn as a wall.
    pub fn from_ascii(rows: &[&str]) -> GridData {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = GridData::new_open(width, height);
        let mut start = grid.start_position;
        let mut end = grid.end_position;
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let p = Position::new(x as i32, y as i32);
                match c {
                    '#' => grid.set_wall(p, true),
                    'S' => start = p,
                    'E' => end = p,
                    _ => {}
                }
            }
        }
        grid.set_endpoints(start, end);
        grid
    }

    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, position: Position) -> Option<&GridCell> {
        self.index(position.x, position.y).map(|ix| &self.cells[ix])
    }

    /// Marks a cell as wall (not walkable) or clears it back to empty.
    pub fn set_wall(&mut self, position: Position, wall: bool) {
        if let Some(ix) = self.index(position.x, position.y) {
            let cell = &mut self.cells[ix];
            cell.walkable = !wall;
            cell.kind = if wall { CellKind::Wall } else { CellKind::Empty };
        }
    }

    /// Moves the start and end markers, clearing the previous ones. Both cells
    /// are made walkable.
    pub fn set_endpoints(&mut self, start: Position, end: Position) {
        for cell in self.cells.iter_mut() {
            if matches!(cell.kind, CellKind::Start | CellKind::End) {
                cell.kind = CellKind::Empty;
            }
        }
        for (p, kind) in [(start, CellKind::Start), (end, CellKind::End)] {
            if let Some(ix) = self.index(p.x, p.y) {
                self.cells[ix].walkable = true;
                self.cells[ix].kind = kind;
            }
        }
        self.start_position = start;
        self.end_position = end;
    }

    pub fn analyze(&self) -> GridAnalysis {
        let walkable_cells = self.cells.iter().filter(|c| c.walkable).count();
        let total_cells = self.width * self.height;
        GridAnalysis {
            width: self.width,
            height: self.height,
            total_cells,
            walkable_cells,
            wall_cells: total_cells.saturating_sub(walkable_cells),
            start_position: self.start_position,
            end_position: self.end_position,
        }
    }
}

/// Summary counts over a [GridData].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridAnalysis {
    pub width: usize,
    pub height: usize,
    pub total_cells: usize,
    pub walkable_cells: usize,
    pub wall_cells: usize,
    pub start_position: Position,
    pub end_position: Position,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub nodes_explored: usize,
    pub execution_time_ms: f64,
    pub path_length: usize,
    pub memory_used: usize,
}

/// Output of every engine. `path` never contains the start or the end cell;
/// it is empty when no route exists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmResult {
    pub path: Vec<Position>,
    pub visited: Vec<Position>,
    pub metrics: Metrics,
}

impl AlgorithmResult {
    /// The path with `start` and `end` re-attached, as a renderer would draw it.
    pub fn route(&self, start: Position, end: Position) -> Vec<Position> {
        let mut route = Vec::with_capacity(self.path.len() + 2);
        route.push(start);
        route.extend(self.path.iter().copied());
        if start != end {
            route.push(end);
        }
        route
    }

    /// Euclidean length of [route](Self::route).
    pub fn route_cost(&self, start: Position, end: Position) -> f64 {
        let route = self.route(start, end);
        route
            .windows(2)
            .map(|w| w[0].euclidean_distance(&w[1]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_grid_layout() {
        let grid = GridData::new_open(8, 4);
        assert_eq!(grid.cells.len(), 32);
        assert_eq!(grid.start_position, Position::new(2, 2));
        assert_eq!(grid.end_position, Position::new(6, 2));
        for (ix, cell) in grid.cells.iter().enumerate() {
            assert_eq!(cell.x as usize, ix % 8);
            assert_eq!(cell.y as usize, ix / 8);
        }
        assert_eq!(grid.cell(Position::new(2, 2)).unwrap().kind, CellKind::Start);
    }

    #[test]
    fn ascii_walls_and_endpoints() {
        let grid = GridData::from_ascii(&["S.#", ".##", "..E"]);
        assert_eq!(grid.start_position, Position::new(0, 0));
        assert_eq!(grid.end_position, Position::new(2, 2));
        let analysis = grid.analyze();
        assert_eq!(analysis.total_cells, 9);
        assert_eq!(analysis.wall_cells, 3);
        assert!(!grid.cell(Position::new(1, 1)).unwrap().walkable);
    }

    #[test]
    fn serializes_with_wire_names() {
        let grid = GridData::new_open(2, 1);
        let json = serde_json::to_value(&grid).unwrap();
        assert!(json.get("startPosition").is_some());
        assert_eq!(json["cells"][0]["type"], "start");
        let back: GridData = serde_json::from_value(json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn route_reattaches_endpoints() {
        let result = AlgorithmResult {
            path: vec![Position::new(1, 0)],
            ..Default::default()
        };
        let route = result.route(Position::new(0, 0), Position::new(2, 0));
        assert_eq!(route.len(), 3);
        assert!((result.route_cost(Position::new(0, 0), Position::new(2, 0)) - 2.0).abs() < 1e-9);
    }
}
