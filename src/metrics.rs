use serde::Serialize;

use crate::options::AlgorithmKind;
use crate::search::FxIndexMap;
use crate::types::Metrics;

/// Running averages over every recorded run of one engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmStats {
    pub id: AlgorithmKind,
    pub name: &'static str,
    pub total_executions: u64,
    pub average_execution_time: f64,
    pub average_nodes_explored: f64,
    pub average_memory_used: f64,
    /// Percentage of runs that found a path.
    pub success_rate: f64,
}

impl AlgorithmStats {
    fn new(id: AlgorithmKind) -> AlgorithmStats {
        AlgorithmStats {
            id,
            name: id.info().name,
            total_executions: 0,
            average_execution_time: 0.0,
            average_nodes_explored: 0.0,
            average_memory_used: 0.0,
            success_rate: 100.0,
        }
    }
}

fn running_mean(average: f64, value: f64, count: u64) -> f64 {
    (average * (count - 1) as f64 + value) / count as f64
}

/// Per-engine statistics, owned by whoever drives the engines. Nothing in the
/// engines touches it; callers [record](Self::record) after each run.
#[derive(Clone, Debug)]
pub struct MetricsStore {
    stats: FxIndexMap<AlgorithmKind, AlgorithmStats>,
}

impl Default for MetricsStore {
    fn default() -> Self {
        MetricsStore {
            stats: AlgorithmKind::ALL
                .into_iter()
                .map(|kind| (kind, AlgorithmStats::new(kind)))
                .collect(),
        }
    }
}

impl MetricsStore {
    pub fn new() -> MetricsStore {
        MetricsStore::default()
    }

    pub fn record(&mut self, kind: AlgorithmKind, metrics: &Metrics, success: bool) {
        let stats = self
            .stats
            .entry(kind)
            .or_insert_with(|| AlgorithmStats::new(kind));
        stats.total_executions += 1;
        let n = stats.total_executions;
        stats.success_rate = running_mean(stats.success_rate, if success { 100.0 } else { 0.0 }, n);
        stats.average_execution_time =
            running_mean(stats.average_execution_time, metrics.execution_time_ms, n);
        stats.average_nodes_explored =
            running_mean(stats.average_nodes_explored, metrics.nodes_explored as f64, n);
        stats.average_memory_used =
            running_mean(stats.average_memory_used, metrics.memory_used as f64, n);
    }

    pub fn get(&self, kind: AlgorithmKind) -> Option<&AlgorithmStats> {
        self.stats.get(&kind)
    }

    /// Statistics for every engine, in [AlgorithmKind::ALL] order.
    pub fn all(&self) -> impl Iterator<Item = &AlgorithmStats> {
        self.stats.values()
    }

    pub fn reset(&mut self) {
        *self = MetricsStore::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(nodes: usize, time: f64, memory: usize) -> Metrics {
        Metrics {
            nodes_explored: nodes,
            execution_time_ms: time,
            path_length: 0,
            memory_used: memory,
        }
    }

    #[test]
    fn seeded_for_every_engine() {
        let store = MetricsStore::new();
        assert_eq!(store.all().count(), 5);
        let astar = store.get(AlgorithmKind::Astar).unwrap();
        assert_eq!(astar.total_executions, 0);
        assert_eq!(astar.success_rate, 100.0);
        assert_eq!(astar.name, "A* Algorithm");
    }

    #[test]
    fn running_averages() {
        let mut store = MetricsStore::new();
        store.record(AlgorithmKind::Jps, &run(10, 2.0, 400), true);
        store.record(AlgorithmKind::Jps, &run(20, 4.0, 800), false);
        let jps = store.get(AlgorithmKind::Jps).unwrap();
        assert_eq!(jps.total_executions, 2);
        assert_eq!(jps.average_nodes_explored, 15.0);
        assert_eq!(jps.average_execution_time, 3.0);
        assert_eq!(jps.average_memory_used, 600.0);
        assert_eq!(jps.success_rate, 50.0);
        // Other engines are untouched.
        assert_eq!(store.get(AlgorithmKind::Hpa).unwrap().total_executions, 0);
        store.reset();
        assert_eq!(store.get(AlgorithmKind::Jps).unwrap().total_executions, 0);
    }

    #[test]
    fn serializes_with_wire_names() {
        let store = MetricsStore::new();
        let json = serde_json::to_value(store.get(AlgorithmKind::Bts).unwrap()).unwrap();
        assert_eq!(json["id"], "bts");
        assert_eq!(json["successRate"], 100.0);
        assert_eq!(json["totalExecutions"], 0);
    }
}
