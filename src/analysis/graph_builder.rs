/// Transaction Graph Builder
/// Folds a validated transaction list into the structures every detector reads
use crate::core::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-account flow statistics, mutated only during graph build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountStats {
    pub in_count: usize,
    pub out_count: usize,
    pub in_sum: f64,
    pub out_sum: f64,
}

impl AccountStats {
    pub fn total_count(&self) -> usize {
        self.in_count + self.out_count
    }
}

/// One transfer as seen from an adjacency list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjEntry {
    pub peer: String,
    pub tx_id: String,
    pub amount: f64,
    pub ts: i64,
}

/// Aggregated directed edge keyed by (source, target).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeAggregate {
    pub source: String,
    pub target: String,
    pub amount_sum: f64,
    pub count: usize,
}

/// The transaction graph: both adjacency indexes, per-account stats and
/// the aggregated edge map.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    pub out_adj: HashMap<String, Vec<AdjEntry>>,
    pub in_adj: HashMap<String, Vec<AdjEntry>>,
    pub stats: HashMap<String, AccountStats>,
    pub edges: HashMap<(String, String), EdgeAggregate>,
}

impl FlowGraph {
    /// Single pass over the transaction list. Adjacency lists end up
    /// ascending by (ts, tx_id) so detectors can iterate monotonically.
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph = FlowGraph::default();

        for tx in transactions {
            let sender_stats = graph.stats.entry(tx.sender.clone()).or_default();
            sender_stats.out_count += 1;
            sender_stats.out_sum += tx.amount;

            let receiver_stats = graph.stats.entry(tx.receiver.clone()).or_default();
            receiver_stats.in_count += 1;
            receiver_stats.in_sum += tx.amount;

            graph
                .out_adj
                .entry(tx.sender.clone())
                .or_default()
                .push(AdjEntry {
                    peer: tx.receiver.clone(),
                    tx_id: tx.tx_id.clone(),
                    amount: tx.amount,
                    ts: tx.timestamp_ms,
                });
            graph
                .in_adj
                .entry(tx.receiver.clone())
                .or_default()
                .push(AdjEntry {
                    peer: tx.sender.clone(),
                    tx_id: tx.tx_id.clone(),
                    amount: tx.amount,
                    ts: tx.timestamp_ms,
                });

            let edge = graph
                .edges
                .entry((tx.sender.clone(), tx.receiver.clone()))
                .or_insert_with(|| EdgeAggregate {
                    source: tx.sender.clone(),
                    target: tx.receiver.clone(),
                    amount_sum: 0.0,
                    count: 0,
                });
            edge.amount_sum += tx.amount;
            edge.count += 1;
        }

        for list in graph.out_adj.values_mut() {
            list.sort_by(|a, b| a.ts.cmp(&b.ts).then_with(|| a.tx_id.cmp(&b.tx_id)));
        }
        for list in graph.in_adj.values_mut() {
            list.sort_by(|a, b| a.ts.cmp(&b.ts).then_with(|| a.tx_id.cmp(&b.tx_id)));
        }

        graph
    }

    /// Account ids in lexicographic order; detectors iterate this for
    /// deterministic emission.
    pub fn accounts_sorted(&self) -> Vec<&String> {
        let mut accounts: Vec<&String> = self.stats.keys().collect();
        accounts.sort();
        accounts
    }

    pub fn outgoing(&self, account: &str) -> &[AdjEntry] {
        self.out_adj.get(account).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn incoming(&self, account: &str) -> &[AdjEntry] {
        self.in_adj.get(account).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_low_activity(&self, account: &str, max_total: usize) -> bool {
        self.stats
            .get(account)
            .map(|s| s.total_count() <= max_total)
            .unwrap_or(true)
    }

    pub fn account_count(&self) -> usize {
        self.stats.len()
    }
}
