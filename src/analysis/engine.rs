/// Analysis Engine
/// One synchronous pass from a validated transaction list to the forensic
/// report; stateless between calls
use crate::analysis::centrality;
use crate::analysis::cycle_detector::CycleDetector;
use crate::analysis::graph_builder::FlowGraph;
use crate::analysis::layering_detector::LayeringDetector;
use crate::analysis::ring::{dedup_rings, Ring};
use crate::analysis::scorer::{self, AccountFlags, ScoredAccount};
use crate::analysis::smurfing_detector::SmurfingDetector;
use crate::core::{AnalysisConfig, Transaction};
use serde::{Deserialize, Serialize};

/// Graph node as reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub suspicion_score: u8,
    pub centrality: f64,
    pub flags: AccountFlags,
}

/// Aggregated edge as reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Findings {
    pub suspicious_accounts: Vec<ScoredAccount>,
    pub fraud_rings: Vec<Ring>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub graph: GraphView,
    pub report: Findings,
}

impl AnalysisReport {
    fn empty() -> Self {
        AnalysisReport {
            graph: GraphView {
                nodes: vec![],
                edges: vec![],
            },
            report: Findings {
                suspicious_accounts: vec![],
                fraud_rings: vec![],
            },
        }
    }
}

/// The pure analysis engine. Same input, same report, byte for byte.
pub struct AnalysisEngine {
    config: AnalysisConfig,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AnalysisConfig::default())
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, transactions: &[Transaction]) -> AnalysisReport {
        if transactions.is_empty() {
            return AnalysisReport::empty();
        }
        let graph = FlowGraph::build(transactions);

        let mut rings: Vec<Ring> = Vec::new();
        if graph.account_count() <= self.config.cycle_max_accounts
            && transactions.len() <= self.config.cycle_max_transactions
        {
            rings.extend(CycleDetector::new(&self.config).detect(&graph));
        } else {
            tracing::warn!(
                "Cycle detection skipped for oversize input: {} accounts / {} transactions",
                graph.account_count(),
                transactions.len()
            );
        }
        rings.extend(SmurfingDetector::new(&self.config).detect(&graph));
        rings.extend(LayeringDetector::new(&self.config).detect(&graph));
        let rings = dedup_rings(rings);

        let centrality = centrality::betweenness(&graph, self.config.centrality_max_accounts);
        let scored = scorer::score_accounts(&graph, &rings, &centrality);

        let nodes: Vec<NodeView> = scored
            .iter()
            .map(|account| NodeView {
                id: account.account_id.clone(),
                suspicion_score: account.suspicion_score,
                centrality: centrality
                    .get(&account.account_id)
                    .copied()
                    .unwrap_or(0.0),
                flags: account.flags,
            })
            .collect();

        let mut edges: Vec<EdgeView> = graph
            .edges
            .values()
            .map(|edge| EdgeView {
                source: edge.source.clone(),
                target: edge.target.clone(),
                amount: edge.amount_sum,
                count: edge.count,
            })
            .collect();
        edges.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then_with(|| a.target.cmp(&b.target))
        });

        let mut suspicious_accounts: Vec<ScoredAccount> = scored
            .into_iter()
            .filter(|account| account.suspicion_score > 0)
            .collect();
        suspicious_accounts.sort_by(|a, b| {
            b.suspicion_score
                .cmp(&a.suspicion_score)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });

        AnalysisReport {
            graph: GraphView { nodes, edges },
            report: Findings {
                suspicious_accounts,
                fraud_rings: rings,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ring::RingPattern;
    use crate::core::config::HOUR_MS;

    fn tx(id: &str, sender: &str, receiver: &str, amount: f64, ts_hours: i64) -> Transaction {
        Transaction {
            tx_id: id.to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            timestamp_ms: ts_hours * HOUR_MS,
        }
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let report = AnalysisEngine::with_defaults().analyze(&[]);
        assert!(report.graph.nodes.is_empty());
        assert!(report.graph.edges.is_empty());
        assert!(report.report.suspicious_accounts.is_empty());
        assert!(report.report.fraud_rings.is_empty());
    }

    #[test]
    fn cycle_detection_respects_account_cap() {
        let config = AnalysisConfig {
            cycle_max_accounts: 2,
            ..AnalysisConfig::default()
        };
        let report = AnalysisEngine::new(config).analyze(&[
            tx("T1", "A", "B", 100.0, 1),
            tx("T2", "B", "C", 100.0, 2),
            tx("T3", "C", "A", 100.0, 3),
        ]);
        assert!(report
            .report
            .fraud_rings
            .iter()
            .all(|r| r.pattern != RingPattern::CircularRouting));
    }

    #[test]
    fn nodes_and_edges_are_ordered() {
        let report = AnalysisEngine::with_defaults().analyze(&[
            tx("T1", "C", "A", 10.0, 1),
            tx("T2", "B", "A", 10.0, 2),
            tx("T3", "B", "C", 10.0, 3),
        ]);
        let ids: Vec<&str> = report.graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        let edge_keys: Vec<(&str, &str)> = report
            .graph
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(edge_keys, vec![("B", "A"), ("B", "C"), ("C", "A")]);
    }

    #[test]
    fn suspicious_list_is_score_ordered() {
        // a cycle plus an unrelated transfer: only cycle members show up
        let report = AnalysisEngine::with_defaults().analyze(&[
            tx("T1", "A", "B", 100.0, 1),
            tx("T2", "B", "C", 100.0, 2),
            tx("T3", "C", "A", 100.0, 3),
            tx("T4", "X", "Y", 5.0, 4),
        ]);
        let accounts = &report.report.suspicious_accounts;
        assert_eq!(accounts.len(), 3);
        for pair in accounts.windows(2) {
            assert!(pair[0].suspicion_score >= pair[1].suspicion_score);
        }
        assert!(accounts.iter().all(|a| a.flags.cycle));
    }
}
