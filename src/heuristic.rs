use core::fmt;
use std::f64::consts::SQRT_2;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use grid_util::Point;

use crate::error::PathfindingError;
use crate::TIE_BREAKER_SCALE;

pub fn manhattan_distance(a: &Point, b: &Point) -> f64 {
    a.manhattan_distance(b) as f64
}

pub fn euclidean_distance(a: &Point, b: &Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx.hypot(dy)
}

/// Octile distance: as many diagonal steps as possible, then straight ones.
pub fn diagonal_distance(a: &Point, b: &Point) -> f64 {
    let dx = (a.x - b.x).abs() as f64;
    let dy = (a.y - b.y).abs() as f64;
    dx.max(dy) + (SQRT_2 - 1.0) * dx.min(dy)
}

/// Distance estimate selectable per search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    #[default]
    Manhattan,
    Euclidean,
    Diagonal,
}

impl Heuristic {
    pub const ALL: [Heuristic; 3] = [
        Heuristic::Manhattan,
        Heuristic::Euclidean,
        Heuristic::Diagonal,
    ];

    pub fn distance(self, a: &Point, b: &Point) -> f64 {
        match self {
            Heuristic::Manhattan => manhattan_distance(a, b),
            Heuristic::Euclidean => euclidean_distance(a, b),
            Heuristic::Diagonal => diagonal_distance(a, b),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Heuristic::Manhattan => "manhattan",
            Heuristic::Euclidean => "euclidean",
            Heuristic::Diagonal => "diagonal",
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Heuristic {
    type Err = PathfindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Heuristic::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| PathfindingError::UnknownHeuristic(s.to_owned()))
    }
}

/// Small penalty proportional to how far `p` strays from the line through
/// `origin` and `target`. Added to `h` it makes straighter candidates win ties.
pub fn tie_breaker(p: &Point, origin: &Point, target: &Point) -> f64 {
    let dx1 = (p.x - target.x) as f64;
    let dy1 = (p.y - target.y) as f64;
    let dx2 = (origin.x - target.x) as f64;
    let dy2 = (origin.y - target.y) as f64;
    (dx1 * dy2 - dx2 * dy1).abs() * TIE_BREAKER_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(Heuristic::Manhattan.distance(&a, &b), 7.0);
        assert!((Heuristic::Euclidean.distance(&a, &b) - 5.0).abs() < 1e-12);
        assert!((Heuristic::Diagonal.distance(&a, &b) - (1.0 + 3.0 * SQRT_2)).abs() < 1e-12);
    }

    /// The octile distance is exactly the cheapest 8-connected cost on an open grid.
    #[test]
    fn diagonal_never_exceeds_manhattan() {
        for x in -4..=4 {
            for y in -4..=4 {
                let a = Point::new(0, 0);
                let b = Point::new(x, y);
                assert!(diagonal_distance(&a, &b) <= manhattan_distance(&a, &b) + 1e-12);
                assert!(euclidean_distance(&a, &b) <= diagonal_distance(&a, &b) + 1e-12);
            }
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("euclidean".parse::<Heuristic>().unwrap(), Heuristic::Euclidean);
        assert!("chebyshev".parse::<Heuristic>().is_err());
    }

    #[test]
    fn tie_breaker_is_zero_on_the_line() {
        let origin = Point::new(0, 2);
        let target = Point::new(4, 2);
        assert_eq!(tie_breaker(&Point::new(2, 2), &origin, &target), 0.0);
        assert!(tie_breaker(&Point::new(2, 3), &origin, &target) > 0.0);
    }
}
