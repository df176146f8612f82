use core::fmt;
use std::f64::consts::SQRT_2;

use grid_util::grid::{BoolGrid, ValueGrid};
use grid_util::point::Point;
use log::debug;
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;

use crate::types::GridData;
use crate::N_SMALLVEC_SIZE;

/// Neighbour offsets in the order N, E, S, W, NE, SE, SW, NW, with `y` growing downwards.
const SEARCH_ORDER: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Read-only view of a [GridData] that a single search owns. Walkability is
/// copied into a [BoolGrid] (`true` meaning blocked) so nothing a search does
/// can reach the caller's data. [PathingGrid] also keeps a [UnionFind] over
/// walkable cells, which is only meaningful after
/// [generate_components](Self::generate_components).
#[derive(Clone, Debug)]
pub struct PathingGrid {
    pub grid: BoolGrid,
    pub components: UnionFind<usize>,
}

impl PathingGrid {
    pub fn new(data: &GridData) -> PathingGrid {
        let mut grid = BoolGrid::new(data.width, data.height, true);
        let width = data.width.max(1);
        for (ix, cell) in data.cells.iter().enumerate().take(data.width * data.height) {
            grid.set((ix % width) as i32, (ix / width) as i32, !cell.walkable);
        }
        PathingGrid {
            grid,
            components: UnionFind::new(data.width * data.height),
        }
    }

    /// Same as [new](Self::new) followed by [generate_components](Self::generate_components).
    pub fn with_components(data: &GridData, allow_diagonal: bool) -> PathingGrid {
        let mut grid = PathingGrid::new(data);
        grid.generate_components(allow_diagonal);
        grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn is_valid_position(&self, x: i32, y: i32) -> bool {
        self.grid.index_in_bounds(x, y)
    }

    pub fn get_ix_point(&self, p: &Point) -> usize {
        self.grid.get_ix_point(p)
    }

    /// False outside the grid.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.is_valid_position(x, y) && !self.grid.get(x, y)
    }

    pub fn can_move_to(&self, pos: Point) -> bool {
        self.is_walkable(pos.x, pos.y)
    }

    /// Walkable neighbours in the order N, E, S, W and then, with diagonals,
    /// NE, SE, SW, NW. Diagonal moves may cut corners.
    pub fn neighbors(&self, p: &Point, allow_diagonal: bool) -> SmallVec<[Point; N_SMALLVEC_SIZE]> {
        let count = if allow_diagonal { 8 } else { 4 };
        SEARCH_ORDER[..count]
            .iter()
            .map(|(dx, dy)| Point::new(p.x + dx, p.y + dy))
            .filter(|n| self.can_move_to(*n))
            .collect()
    }

    /// Step cost between two adjacent cells: 1 straight, sqrt(2) diagonal.
    pub fn cost(&self, a: &Point, b: &Point) -> f64 {
        if a == b {
            0.0
        } else if a.dir_obj(b).diagonal() {
            SQRT_2
        } else {
            1.0
        }
    }

    /// Bresenham walk from `from` to `to`. Every cell strictly between the two
    /// has to be walkable; the endpoints themselves are not checked.
    pub fn has_line_of_sight(&self, from: &Point, to: &Point) -> bool {
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        let sx = (to.x - from.x).signum();
        let sy = (to.y - from.y).signum();
        let mut err = dx + dy;
        let mut x = from.x;
        let mut y = from.y;
        loop {
            if x == to.x && y == to.y {
                return true;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            if (x != to.x || y != to.y) && !self.is_walkable(x, y) {
                return false;
            }
        }
    }

    /// Retrieves the component id a given [Point] belongs to.
    pub fn get_component(&self, p: &Point) -> usize {
        self.components.find(self.get_ix_point(p))
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }

    /// Checks if start and goal are not on the same component. Points outside
    /// the grid or on walls are never reachable.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.can_move_to(*start) && self.can_move_to(*goal) {
            !self
                .components
                .equiv(self.get_ix_point(start), self.get_ix_point(goal))
        } else {
            true
        }
    }

    /// Generates a new [UnionFind] structure and links up walkable grid
    /// neighbours to the same components.
    pub fn generate_components(&mut self, allow_diagonal: bool) {
        let w = self.width();
        let h = self.height();
        debug!("Generating connected components for {}x{} grid", w, h);
        self.components = UnionFind::new(w * h);
        // East and south, plus both downward diagonals, see every adjacency once.
        let forward: &[(i32, i32)] = if allow_diagonal {
            &[(1, 0), (0, 1), (1, 1), (-1, 1)]
        } else {
            &[(1, 0), (0, 1)]
        };
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                if !self.is_walkable(x, y) {
                    continue;
                }
                let point = Point::new(x, y);
                let parent_ix = self.get_ix_point(&point);
                for (dx, dy) in forward {
                    let n = Point::new(x + dx, y + dy);
                    if self.can_move_to(n) {
                        self.components.union(parent_ix, self.get_ix_point(&n));
                    }
                }
            }
        }
    }
}

impl fmt::Display for PathingGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Grid:")?;
        for y in 0..self.height() as i32 {
            let values = (0..self.width() as i32)
                .map(|x| !self.is_walkable(x, y) as i32)
                .collect::<Vec<i32>>();
            writeln!(f, "{:?}", values)?;
        }
        Ok(())
    }
}
