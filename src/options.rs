use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathfindingError;
use crate::heuristic::Heuristic;

/// The five engines, named by their wire ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    Astar,
    Jps,
    Bts,
    Flowfield,
    Hpa,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 5] = [
        AlgorithmKind::Astar,
        AlgorithmKind::Jps,
        AlgorithmKind::Bts,
        AlgorithmKind::Flowfield,
        AlgorithmKind::Hpa,
    ];

    pub fn id(self) -> &'static str {
        match self {
            AlgorithmKind::Astar => "astar",
            AlgorithmKind::Jps => "jps",
            AlgorithmKind::Bts => "bts",
            AlgorithmKind::Flowfield => "flowfield",
            AlgorithmKind::Hpa => "hpa",
        }
    }

    /// Catalogue entry shown next to each engine.
    pub fn info(self) -> AlgorithmInfo {
        match self {
            AlgorithmKind::Astar => AlgorithmInfo {
                id: self,
                name: "A* Algorithm",
                description: "A widely used pathfinding algorithm that uses heuristics to find the shortest path efficiently. It combines the advantages of Dijkstra's algorithm and greedy best-first search.",
                complexity_time: "O(E log V)",
                complexity_space: "O(V)",
                color: "#8b5cf6",
            },
            AlgorithmKind::Jps => AlgorithmInfo {
                id: self,
                name: "Jump Point Search",
                description: "An optimization of A* for uniform-cost grids that identifies \"jump points\" to skip unnecessary nodes, dramatically reducing computation time while maintaining path optimality.",
                complexity_time: "O(E log V)",
                complexity_space: "O(V)",
                color: "#ec4899",
            },
            AlgorithmKind::Bts => AlgorithmInfo {
                id: self,
                name: "Bidirectional Theta*",
                description: "A bidirectional version of Theta* that searches from both start and end simultaneously while allowing any-angle movements, resulting in more natural and smooth paths.",
                complexity_time: "O(E log V)",
                complexity_space: "O(V)",
                color: "#f59e0b",
            },
            AlgorithmKind::Flowfield => AlgorithmInfo {
                id: self,
                name: "Flow Field Pathfinding",
                description: "Creates a vector field across the entire grid that multiple agents can follow simultaneously, ideal for crowd simulation and multi-agent pathfinding scenarios.",
                complexity_time: "O(V)",
                complexity_space: "O(V)",
                color: "#10b981",
            },
            AlgorithmKind::Hpa => AlgorithmInfo {
                id: self,
                name: "Hierarchical Pathfinding A*",
                description: "A multi-level abstraction approach that creates a hierarchical graph of the environment, solving complex path queries efficiently by breaking them into smaller, simpler problems.",
                complexity_time: "O(E log V)",
                complexity_space: "O(V + A)",
                color: "#3b82f6",
            },
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AlgorithmKind {
    type Err = PathfindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlgorithmKind::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| PathfindingError::UnknownAlgorithm(s.to_owned()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmInfo {
    pub id: AlgorithmKind,
    pub name: &'static str,
    pub description: &'static str,
    pub complexity_time: &'static str,
    pub complexity_space: &'static str,
    pub color: &'static str,
}

/// Per-search knobs. Missing fields take the [Default] values when
/// deserializing, so a partial options object is merged over the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlgorithmOptions {
    pub allow_diagonal: bool,
    pub heuristic: Heuristic,
    /// Multiplier on the heuristic. Above 1 trades optimality for speed.
    pub weight: f64,
    pub bidirectional: bool,
    pub tie_breaker: bool,
}

impl Default for AlgorithmOptions {
    fn default() -> Self {
        AlgorithmOptions {
            allow_diagonal: true,
            heuristic: Heuristic::Manhattan,
            weight: 1.0,
            bidirectional: false,
            tie_breaker: true,
        }
    }
}

impl AlgorithmOptions {
    /// The preset each engine is shown with.
    pub fn for_algorithm(kind: AlgorithmKind) -> AlgorithmOptions {
        let base = AlgorithmOptions::default();
        match kind {
            AlgorithmKind::Astar => base,
            AlgorithmKind::Jps | AlgorithmKind::Hpa => AlgorithmOptions {
                heuristic: Heuristic::Euclidean,
                ..base
            },
            AlgorithmKind::Bts => AlgorithmOptions {
                heuristic: Heuristic::Euclidean,
                bidirectional: true,
                ..base
            },
            AlgorithmKind::Flowfield => AlgorithmOptions {
                heuristic: Heuristic::Euclidean,
                tie_breaker: false,
                ..base
            },
        }
    }

    pub fn with_diagonal(mut self, allow_diagonal: bool) -> Self {
        self.allow_diagonal = allow_diagonal;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_tie_breaker(mut self, tie_breaker: bool) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }
}
