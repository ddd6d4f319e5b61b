/// Betweenness Centrality
/// Brandes' unweighted algorithm over the simple directed graph
use crate::analysis::graph_builder::FlowGraph;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, VecDeque};

/// Normalized betweenness per account. Multi-edges are collapsed; values
/// are divided by the maximum observed so they lie in [0,1]. Above the
/// account cap every score is zero (cost guard).
pub fn betweenness(graph: &FlowGraph, max_accounts: usize) -> HashMap<String, f64> {
    let accounts = graph.accounts_sorted();
    let mut scores: HashMap<String, f64> =
        accounts.iter().map(|a| ((*a).clone(), 0.0)).collect();
    if accounts.len() > max_accounts || accounts.len() < 3 {
        return scores;
    }

    let mut digraph: DiGraph<(), ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for account in &accounts {
        index.insert(account.as_str(), digraph.add_node(()));
    }
    // the edge aggregate is already one entry per (source, target) pair;
    // insertion order is fixed so float accumulation stays reproducible
    let mut edge_keys: Vec<&(String, String)> = graph.edges.keys().collect();
    edge_keys.sort();
    for (source, target) in edge_keys {
        if source != target {
            digraph.add_edge(index[source.as_str()], index[target.as_str()], ());
        }
    }

    let n = digraph.node_count();
    let mut raw = vec![0.0f64; n];

    for source in digraph.node_indices() {
        // forward phase: BFS shortest-path counting
        let mut order: Vec<NodeIndex> = Vec::with_capacity(n);
        let mut preds: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![-1i64; n];
        sigma[source.index()] = 1.0;
        dist[source.index()] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for w in digraph.neighbors(v) {
                if dist[w.index()] < 0 {
                    dist[w.index()] = dist[v.index()] + 1;
                    queue.push_back(w);
                }
                if dist[w.index()] == dist[v.index()] + 1 {
                    sigma[w.index()] += sigma[v.index()];
                    preds[w.index()].push(v);
                }
            }
        }

        // backward phase: dependency accumulation
        let mut delta = vec![0.0f64; n];
        while let Some(w) = order.pop() {
            for &v in &preds[w.index()] {
                delta[v.index()] +=
                    sigma[v.index()] / sigma[w.index()] * (1.0 + delta[w.index()]);
            }
            if w != source {
                raw[w.index()] += delta[w.index()];
            }
        }
    }

    let max = raw.iter().cloned().fold(0.0f64, f64::max);
    if max > 0.0 {
        for account in &accounts {
            scores.insert(
                (*account).clone(),
                raw[index[account.as_str()].index()] / max,
            );
        }
    }
    scores
}
