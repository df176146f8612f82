//! Hierarchical pathfinding: the grid is cut into square clusters, walkable
//! cell pairs straddling a cluster border become entrances, and a small
//! abstract graph over the entrances is searched before each abstract hop is
//! refined with a local grid search.
use fxhash::FxHashSet;
use grid_util::{Point, Rect, SimpleValueGrid, ValueGrid};
use itertools::Itertools;
use log::{info, warn};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use smallvec::{smallvec, SmallVec};

use crate::heuristic::{euclidean_distance, tie_breaker};
use crate::options::{AlgorithmKind, AlgorithmOptions};
use crate::pathing_grid::PathingGrid;
use crate::priority_queue::PriorityQueue;
use crate::search::interior;
use crate::solver::astar::grid_astar;
use crate::solver::{GridSolver, Solution};
use crate::types::Metrics;

const MAX_CLUSTER_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, Default)]
pub struct HpaSolver;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Cluster {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.width && p.y < self.y + self.height
    }

    fn centroid_distance(&self, p: &Point) -> f64 {
        let cx = self.x as f64 + self.width as f64 / 2.0;
        let cy = self.y as f64 + self.height as f64 / 2.0;
        (p.x as f64 - cx).hypot(p.y as f64 - cy)
    }
}

/// A walkable pair of adjacent cells in different clusters. `position` is the
/// cell on the `cluster1_id` side and `outside` the one on the `cluster2_id`
/// side, which lies to the right of or below `position` (diagonally when
/// diagonal moves are allowed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entrance {
    pub id: usize,
    pub position: Point,
    pub outside: Point,
    pub cluster1_id: usize,
    pub cluster2_id: usize,
}

impl Entrance {
    pub fn touches(&self, cluster_id: usize) -> bool {
        self.cluster1_id == cluster_id || self.cluster2_id == cluster_id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbstractNode {
    pub id: usize,
    pub position: Point,
    pub cluster_id: usize,
    pub is_entrance: bool,
    pub is_start_or_end: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbstractEdge {
    pub from: usize,
    pub to: usize,
    pub cost: f64,
}

/// Edge length of the square clusters for a grid of the given size.
pub fn cluster_size(width: usize, height: usize) -> usize {
    MAX_CLUSTER_SIZE.min((width.max(height) / 4).max(1))
}

/// Cluster partition, entrances and the abstract graph over them. Node `i` of
/// the graph is entrance `i`; start and end nodes are appended after them.
#[derive(Clone, Debug)]
pub struct AbstractGraph {
    pub cluster_size: usize,
    width: usize,
    height: usize,
    columns: usize,
    pub clusters: Vec<Cluster>,
    pub entrances: Vec<Entrance>,
    pub graph: UnGraph<AbstractNode, f64>,
}

impl AbstractGraph {
    /// Builds the clusters, entrances and intra-cluster edges. Entrances are
    /// only linked when `grid`'s components say they are mutually reachable.
    pub fn build(grid: &PathingGrid, allow_diagonal: bool) -> AbstractGraph {
        let (width, height) = (grid.width(), grid.height());
        let size = cluster_size(width, height);
        let columns = width.div_ceil(size);
        let mut clusters = Vec::new();
        for y in (0..height).step_by(size) {
            for x in (0..width).step_by(size) {
                clusters.push(Cluster {
                    id: clusters.len(),
                    x: x as i32,
                    y: y as i32,
                    width: size.min(width - x) as i32,
                    height: size.min(height - y) as i32,
                });
            }
        }
        let mut abstraction = AbstractGraph {
            cluster_size: size,
            width,
            height,
            columns,
            clusters,
            entrances: Vec::new(),
            graph: UnGraph::default(),
        };
        abstraction.find_entrances(grid, allow_diagonal);
        for entrance in &abstraction.entrances {
            abstraction.graph.add_node(AbstractNode {
                id: entrance.id,
                position: entrance.position,
                cluster_id: entrance.cluster1_id,
                is_entrance: true,
                is_start_or_end: false,
            });
        }
        abstraction.connect_entrances(grid);
        abstraction
    }

    /// Scans the right and bottom border of every cluster, so each border is
    /// seen once. With diagonal moves a border cell is also paired with the
    /// two cells diagonally across, which catches crossings through a cluster
    /// corner.
    fn find_entrances(&mut self, grid: &PathingGrid, allow_diagonal: bool) {
        let across: &[i32] = if allow_diagonal { &[0, -1, 1] } else { &[0] };
        let mut seen: FxHashSet<(Point, Point)> = FxHashSet::default();
        let mut entrances: Vec<Entrance> = Vec::new();
        for cluster in &self.clusters {
            let right_x = cluster.x + cluster.width;
            let bottom_y = cluster.y + cluster.height;
            let right = (cluster.y..bottom_y).flat_map(|y| {
                across
                    .iter()
                    .map(move |d| (Point::new(right_x - 1, y), Point::new(right_x, y + d)))
            });
            let below = (cluster.x..right_x).flat_map(|x| {
                across
                    .iter()
                    .map(move |d| (Point::new(x, bottom_y - 1), Point::new(x + d, bottom_y)))
            });
            for (inside, outside) in right.chain(below) {
                if !grid.can_move_to(inside) || !grid.can_move_to(outside) {
                    continue;
                }
                let Some(other) = self.cluster_at(&outside) else {
                    continue;
                };
                if other == cluster.id || !seen.insert((inside, outside)) {
                    continue;
                }
                entrances.push(Entrance {
                    id: entrances.len(),
                    position: inside,
                    outside,
                    cluster1_id: cluster.id,
                    cluster2_id: other,
                });
            }
        }
        self.entrances = entrances;
    }

    fn connect_entrances(&mut self, grid: &PathingGrid) {
        for cluster in &self.clusters {
            let members = self
                .entrances
                .iter()
                .filter(|e| e.touches(cluster.id))
                .collect::<Vec<_>>();
            for (a, b) in members.iter().tuple_combinations() {
                if grid.unreachable(&a.position, &b.position) {
                    continue;
                }
                let cost = euclidean_distance(&a.position, &b.position);
                self.graph
                    .update_edge(NodeIndex::new(a.id), NodeIndex::new(b.id), cost);
            }
        }
    }

    /// Cluster whose rectangle holds `p`, if any.
    pub fn cluster_at(&self, p: &Point) -> Option<usize> {
        if p.x < 0 || p.y < 0 {
            return None;
        }
        let row = p.y as usize / self.cluster_size;
        let id = row * self.columns + p.x as usize / self.cluster_size;
        self.clusters
            .get(id)
            .filter(|c| c.contains(p))
            .map(|c| c.id)
    }

    /// [cluster_at](Self::cluster_at), falling back to the cluster with the
    /// nearest centre.
    pub fn cluster_for(&self, p: &Point) -> usize {
        self.cluster_at(p).unwrap_or_else(|| {
            self.clusters
                .iter()
                .min_by(|a, b| a.centroid_distance(p).total_cmp(&b.centroid_distance(p)))
                .map_or(0, |c| c.id)
        })
    }

    /// Adds `p` as a start or end node linked to every reachable entrance of its cluster.
    pub fn insert_endpoint(&mut self, grid: &PathingGrid, p: Point) -> NodeIndex {
        let cluster_id = self.cluster_for(&p);
        let node = self.graph.add_node(AbstractNode {
            id: self.graph.node_count(),
            position: p,
            cluster_id,
            is_entrance: false,
            is_start_or_end: true,
        });
        for entrance in self.entrances.iter().filter(|e| e.touches(cluster_id)) {
            if grid.reachable(&p, &entrance.position) {
                let cost = euclidean_distance(&p, &entrance.position);
                self.graph
                    .update_edge(node, NodeIndex::new(entrance.id), cost);
            }
        }
        node
    }

    /// Clusters a node belongs to: both sides for an entrance.
    fn node_clusters(&self, n: NodeIndex) -> SmallVec<[usize; 2]> {
        let node = &self.graph[n];
        match self.entrances.get(node.id).filter(|_| node.is_entrance) {
            Some(e) => smallvec![e.cluster1_id, e.cluster2_id],
            None => smallvec![node.cluster_id],
        }
    }

    /// Mask of the cells in every cluster either node belongs to.
    pub fn region(&self, a: NodeIndex, b: NodeIndex) -> SimpleValueGrid<bool> {
        let mut mask = SimpleValueGrid::new(self.width, self.height, false);
        let mut ids = self.node_clusters(a);
        ids.extend(self.node_clusters(b));
        for id in ids {
            mask.set_rect(self.clusters[id].rect(), true);
        }
        mask
    }

    pub fn edges(&self) -> Vec<AbstractEdge> {
        self.graph
            .edge_references()
            .map(|e| AbstractEdge {
                from: self.graph[e.source()].id,
                to: self.graph[e.target()].id,
                cost: *e.weight(),
            })
            .collect()
    }

    /// Byte estimate of the abstraction.
    pub fn memory_used(&self) -> usize {
        let nodes = self.graph.node_count();
        self.clusters.len() * 20 + self.entrances.len() * 16 + nodes * 24 + nodes * 4 * 16
    }

    /// Weighted A* over the abstract graph. Returns the node sequence from
    /// `start` to `goal` inclusive.
    pub fn search(
        &self,
        start: NodeIndex,
        goal: NodeIndex,
        options: &AlgorithmOptions,
    ) -> Option<Vec<NodeIndex>> {
        let origin = self.graph[start].position;
        let target = self.graph[goal].position;
        let heuristic = |n: NodeIndex| {
            let p = self.graph[n].position;
            let h = options.heuristic.distance(&p, &target) * options.weight;
            if options.tie_breaker {
                h + tie_breaker(&p, &origin, &target)
            } else {
                h
            }
        };

        let n = self.graph.node_count();
        let mut g = vec![f64::INFINITY; n];
        let mut parent: Vec<Option<NodeIndex>> = vec![None; n];
        let mut closed = vec![false; n];
        let mut open = PriorityQueue::new();
        g[start.index()] = 0.0;
        open.enqueue(start, heuristic(start));
        while let Some((current, _)) = open.dequeue() {
            if current == goal {
                let mut route: Vec<NodeIndex> =
                    std::iter::successors(Some(goal), |n| parent[n.index()]).collect();
                route.reverse();
                return Some(route);
            }
            closed[current.index()] = true;
            for edge in self.graph.edges(current) {
                let next = if edge.source() == current {
                    edge.target()
                } else {
                    edge.source()
                };
                if closed[next.index()] {
                    continue;
                }
                let tentative = g[current.index()] + *edge.weight();
                if tentative < g[next.index()] {
                    g[next.index()] = tentative;
                    parent[next.index()] = Some(current);
                    let f = tentative + heuristic(next);
                    if !open.update_priority(f, |n| *n == next) {
                        open.enqueue(next, f);
                    }
                }
            }
        }
        None
    }
}

impl GridSolver for HpaSolver {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Hpa
    }

    fn solve(
        &self,
        grid: &PathingGrid,
        start: Point,
        end: Point,
        options: &AlgorithmOptions,
    ) -> Solution {
        let mut grid = grid.clone();
        grid.generate_components(options.allow_diagonal);
        let mut abstraction = AbstractGraph::build(&grid, options.allow_diagonal);
        let mut metrics = Metrics::default();

        if start == end {
            metrics.nodes_explored = 1;
            metrics.memory_used = abstraction.memory_used();
            return Solution {
                path: Vec::new(),
                visited: vec![start],
                metrics,
            };
        }
        if grid.unreachable(&start, &end) {
            info!("hpa: {:?} is not reachable from {:?}", end, start);
            metrics.memory_used = abstraction.memory_used();
            return Solution {
                metrics,
                ..Solution::default()
            };
        }

        let start_node = abstraction.insert_endpoint(&grid, start);
        let end_node = abstraction.insert_endpoint(&grid, end);
        if abstraction.cluster_for(&start) == abstraction.cluster_for(&end) {
            abstraction
                .graph
                .update_edge(start_node, end_node, euclidean_distance(&start, &end));
        }
        metrics.memory_used = abstraction.memory_used();

        let mut visited = Vec::new();
        let mut route = abstraction
            .search(start_node, end_node, options)
            .and_then(|waypoints| {
                let mut route: Vec<Point> = vec![start];
                for (a, b) in waypoints.into_iter().tuple_windows() {
                    let from = abstraction.graph[a].position;
                    let to = abstraction.graph[b].position;
                    let region = abstraction.region(a, b);
                    let mut outcome = grid_astar(&grid, from, to, options, Some(&region));
                    if outcome.route.is_none() {
                        metrics.nodes_explored += outcome.nodes_explored;
                        visited.append(&mut outcome.visited);
                        outcome = grid_astar(&grid, from, to, options, None);
                    }
                    metrics.nodes_explored += outcome.nodes_explored;
                    visited.append(&mut outcome.visited);
                    let Some(segment) = outcome.route else {
                        warn!("hpa: could not refine abstract hop {:?} -> {:?}", from, to);
                        return None;
                    };
                    route.extend(segment.into_iter().skip(1));
                }
                Some(route)
            });
        if route.is_none() {
            // Start and end share a component, so a plain grid search succeeds.
            warn!(
                "hpa: abstract search failed from {:?} to {:?}, searching the full grid",
                start, end
            );
            let mut outcome = grid_astar(&grid, start, end, options, None);
            metrics.nodes_explored += outcome.nodes_explored;
            visited.append(&mut outcome.visited);
            route = outcome.route;
        }

        Solution {
            path: route.as_deref().map(interior).unwrap_or_default(),
            visited,
            metrics,
        }
    }
}
