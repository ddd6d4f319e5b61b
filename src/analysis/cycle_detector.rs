/// Cycle Detector
/// Circular fund routing: simple directed cycles with chronologically
/// ordered edges, bounded length
use crate::analysis::graph_builder::FlowGraph;
use crate::analysis::ring::{ring_id, Ring, RingEvidence, RingPattern};
use crate::core::AnalysisConfig;
use std::collections::HashSet;

pub struct CycleDetector<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> CycleDetector<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Emit every simple cycle of length within the configured bounds, at
    /// most once per cycle across all start accounts.
    pub fn detect(&self, graph: &FlowGraph) -> Vec<Ring> {
        let mut rings = Vec::new();
        let mut seen = HashSet::new();
        for start in graph.accounts_sorted() {
            let mut path = vec![start.as_str()];
            let mut tx_path: Vec<(&str, i64)> = Vec::new();
            self.dfs(graph, start, &mut path, &mut tx_path, &mut seen, &mut rings);
        }
        rings
    }

    fn dfs<'g>(
        &self,
        graph: &'g FlowGraph,
        start: &'g str,
        path: &mut Vec<&'g str>,
        tx_path: &mut Vec<(&'g str, i64)>,
        seen: &mut HashSet<String>,
        rings: &mut Vec<Ring>,
    ) {
        let current = *path.last().unwrap();
        for entry in graph.outgoing(current) {
            // edges around the cycle must not move backwards in time
            if let Some(&(_, last_ts)) = tx_path.last() {
                if entry.ts < last_ts {
                    continue;
                }
            }
            let next = entry.peer.as_str();
            if next == start {
                let len = path.len();
                if len >= self.config.cycle_min_len && len <= self.config.cycle_max_len {
                    tx_path.push((entry.tx_id.as_str(), entry.ts));
                    self.emit(path, tx_path, seen, rings);
                    tx_path.pop();
                }
                continue;
            }
            if path.iter().any(|&node| node == next) {
                continue;
            }
            if path.len() < self.config.cycle_max_len {
                path.push(next);
                tx_path.push((entry.tx_id.as_str(), entry.ts));
                self.dfs(graph, start, path, tx_path, seen, rings);
                tx_path.pop();
                path.pop();
            }
        }
    }

    fn emit(
        &self,
        path: &[&str],
        tx_path: &[(&str, i64)],
        seen: &mut HashSet<String>,
        rings: &mut Vec<Ring>,
    ) {
        let identity = canonical_rotation(path);
        if !seen.insert(identity.clone()) {
            return;
        }
        rings.push(Ring {
            id: ring_id(&format!("cycle|{}", identity)),
            pattern: RingPattern::CircularRouting,
            members: path.iter().map(|m| m.to_string()).collect(),
            evidence: RingEvidence {
                tx_ids: tx_path.iter().map(|&(id, _)| id.to_string()).collect(),
                start_ts: tx_path.first().map(|&(_, ts)| ts),
                end_ts: tx_path.last().map(|&(_, ts)| ts),
                hops: Some(path.len()),
                roles: None,
            },
            risk_score: (70 + 5 * path.len()) as u8,
        });
    }
}

/// Rotate the member sequence so the lexicographically smallest id leads,
/// keeping order; the rotated join identifies the cycle regardless of the
/// DFS entry point.
fn canonical_rotation(path: &[&str]) -> String {
    let pivot = path
        .iter()
        .enumerate()
        .min_by_key(|&(_, member)| *member)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated: Vec<&str> = Vec::with_capacity(path.len());
    rotated.extend_from_slice(&path[pivot..]);
    rotated.extend_from_slice(&path[..pivot]);
    rotated.join(",")
}
