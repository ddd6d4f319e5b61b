/// Layering Detector
/// Layered shell chains: long hops through low-activity intermediaries
/// with bounded chronological gaps
use crate::analysis::graph_builder::FlowGraph;
use crate::analysis::ring::{ring_id, Ring, RingEvidence, RingPattern};
use crate::core::AnalysisConfig;
use std::collections::{BTreeSet, HashSet};

pub struct LayeringDetector<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> LayeringDetector<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Emit chains of at least the configured hop count whose interior
    /// accounts are all low-activity. Chains wholly contained in a longer
    /// chain are dropped, so only maximal routes are reported.
    pub fn detect(&self, graph: &FlowGraph) -> Vec<Ring> {
        let mut rings = Vec::new();
        let mut seen = HashSet::new();
        for start in graph.accounts_sorted() {
            if graph.outgoing(start).is_empty() {
                continue;
            }
            let mut path = vec![start.as_str()];
            let mut tx_path: Vec<(&str, i64)> = Vec::new();
            self.dfs(graph, &mut path, &mut tx_path, &mut seen, &mut rings);
        }
        retain_maximal(rings)
    }

    fn dfs<'g>(
        &self,
        graph: &'g FlowGraph,
        path: &mut Vec<&'g str>,
        tx_path: &mut Vec<(&'g str, i64)>,
        seen: &mut HashSet<String>,
        rings: &mut Vec<Ring>,
    ) {
        let current = *path.last().unwrap();
        // a busy intermediary ends the chain; start and end are exempt
        if path.len() >= 2
            && !graph.is_low_activity(current, self.config.low_activity_max_total)
        {
            return;
        }
        if path.len() - 1 >= self.config.layering_max_depth {
            return;
        }
        for entry in graph.outgoing(current) {
            let next = entry.peer.as_str();
            if path.iter().any(|&node| node == next) {
                continue;
            }
            if let Some(&(_, last_ts)) = tx_path.last() {
                if entry.ts < last_ts || entry.ts - last_ts > self.config.layering_max_gap_ms {
                    continue;
                }
            }
            path.push(next);
            tx_path.push((entry.tx_id.as_str(), entry.ts));
            if path.len() - 1 >= self.config.layering_min_hops
                && self.interiors_low_activity(graph, path)
            {
                self.emit(path, tx_path, seen, rings);
            }
            self.dfs(graph, path, tx_path, seen, rings);
            tx_path.pop();
            path.pop();
        }
    }

    fn interiors_low_activity(&self, graph: &FlowGraph, path: &[&str]) -> bool {
        path[1..path.len() - 1]
            .iter()
            .all(|node| graph.is_low_activity(node, self.config.low_activity_max_total))
    }

    fn emit(
        &self,
        path: &[&str],
        tx_path: &[(&str, i64)],
        seen: &mut HashSet<String>,
        rings: &mut Vec<Ring>,
    ) {
        let mut sorted_members: Vec<&str> = path.to_vec();
        sorted_members.sort_unstable();
        let identity = sorted_members.join(",");
        if !seen.insert(identity.clone()) {
            return;
        }
        let interior_count = path.len() - 2;
        rings.push(Ring {
            id: ring_id(&format!("layer|{}", identity)),
            pattern: RingPattern::LayeredShell,
            members: path.iter().map(|m| m.to_string()).collect(),
            evidence: RingEvidence {
                tx_ids: tx_path.iter().map(|&(id, _)| id.to_string()).collect(),
                start_ts: tx_path.first().map(|&(_, ts)| ts),
                end_ts: tx_path.last().map(|&(_, ts)| ts),
                hops: Some(path.len() - 1),
                roles: None,
            },
            risk_score: (65 + (5 * interior_count).min(25)) as u8,
        });
    }
}

/// Drop chains whose member set is strictly contained in another chain's.
fn retain_maximal(rings: Vec<Ring>) -> Vec<Ring> {
    let sets: Vec<BTreeSet<&str>> = rings
        .iter()
        .map(|r| r.members.iter().map(|m| m.as_str()).collect())
        .collect();
    let keep: Vec<bool> = (0..rings.len())
        .map(|i| {
            !(0..rings.len()).any(|j| {
                j != i && sets[i].len() < sets[j].len() && sets[i].is_subset(&sets[j])
            })
        })
        .collect();
    rings
        .into_iter()
        .zip(keep)
        .filter_map(|(ring, keep)| keep.then_some(ring))
        .collect()
}
