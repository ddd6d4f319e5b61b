/// Account Scorer
/// Combines ring flags, smurfing roles and centrality into per-account
/// suspicion scores
use crate::analysis::graph_builder::FlowGraph;
use crate::analysis::ring::{Ring, RingPattern};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BASE_CYCLE: u32 = 45;
const BASE_LAYERING: u32 = 40;
const ROLE_AGGREGATOR: u32 = 50;
const ROLE_SENDER: u32 = 25;
const ROLE_RECEIVER: u32 = 10;
const ROLE_GENERIC: u32 = 25;
/// Degree at or below which centrality weighs double.
const QUIET_DEGREE_MAX: usize = 6;
const CENTRALITY_K_QUIET: f64 = 0.20;
const CENTRALITY_K_BUSY: f64 = 0.10;
const CENTRALITY_CAP_QUIET: f64 = 20.0;
const CENTRALITY_CAP_BUSY: f64 = 10.0;

/// Per-pattern membership flags for an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFlags {
    pub cycle: bool,
    pub smurfing: bool,
    pub layering: bool,
}

impl AccountFlags {
    pub fn any(&self) -> bool {
        self.cycle || self.smurfing || self.layering
    }
}

/// Scored account as emitted into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredAccount {
    pub account_id: String,
    pub suspicion_score: u8,
    pub flags: AccountFlags,
}

#[derive(Debug, Default)]
struct SmurfRoles {
    aggregator: bool,
    sender: bool,
    receiver: bool,
}

/// Flags derive purely from ring membership.
pub fn derive_flags(rings: &[Ring]) -> HashMap<String, AccountFlags> {
    let mut flags: HashMap<String, AccountFlags> = HashMap::new();
    for ring in rings {
        for member in &ring.members {
            let entry = flags.entry(member.clone()).or_default();
            match ring.pattern {
                RingPattern::CircularRouting => entry.cycle = true,
                RingPattern::Smurfing | RingPattern::Dispersal => entry.smurfing = true,
                RingPattern::LayeredShell => entry.layering = true,
            }
        }
    }
    flags
}

/// Score every account in the graph, lexicographically ordered. Accounts
/// with no ring flag score zero; centrality alone never flags an account.
pub fn score_accounts(
    graph: &FlowGraph,
    rings: &[Ring],
    centrality: &HashMap<String, f64>,
) -> Vec<ScoredAccount> {
    let flags = derive_flags(rings);
    let roles = derive_roles(rings);

    graph
        .accounts_sorted()
        .into_iter()
        .map(|account| {
            let account_flags = flags.get(account).copied().unwrap_or_default();
            let score = if account_flags.any() {
                let base = BASE_CYCLE * u32::from(account_flags.cycle)
                    + BASE_LAYERING * u32::from(account_flags.layering);
                let role_bonus = role_bonus(roles.get(account), &account_flags);
                let centrality_bonus = centrality_bonus(
                    centrality.get(account).copied().unwrap_or(0.0),
                    graph
                        .stats
                        .get(account)
                        .map(|s| s.total_count())
                        .unwrap_or(0),
                );
                (base + role_bonus + centrality_bonus).min(100) as u8
            } else {
                0
            };
            ScoredAccount {
                account_id: account.clone(),
                suspicion_score: score,
                flags: account_flags,
            }
        })
        .collect()
}

fn derive_roles(rings: &[Ring]) -> HashMap<String, SmurfRoles> {
    let mut roles: HashMap<String, SmurfRoles> = HashMap::new();
    for ring in rings {
        let Some(ring_roles) = ring.evidence.roles.as_ref() else {
            continue;
        };
        match ring.pattern {
            RingPattern::Smurfing => {
                for sender in &ring_roles.senders {
                    roles.entry(sender.clone()).or_default().sender = true;
                }
                // the one member outside the sender list is the aggregator
                for member in &ring.members {
                    if !ring_roles.senders.contains(member) {
                        roles.entry(member.clone()).or_default().aggregator = true;
                    }
                }
            }
            RingPattern::Dispersal => {
                for receiver in &ring_roles.receivers {
                    roles.entry(receiver.clone()).or_default().receiver = true;
                }
            }
            _ => {}
        }
    }
    roles
}

fn role_bonus(roles: Option<&SmurfRoles>, flags: &AccountFlags) -> u32 {
    match roles {
        Some(r) if r.aggregator => ROLE_AGGREGATOR,
        Some(r) if r.sender => ROLE_SENDER,
        Some(r) if r.receiver => ROLE_RECEIVER,
        _ if flags.smurfing => ROLE_GENERIC,
        _ => 0,
    }
}

fn centrality_bonus(centrality: f64, total_degree: usize) -> u32 {
    let (k, cap) = if total_degree <= QUIET_DEGREE_MAX {
        (CENTRALITY_K_QUIET, CENTRALITY_CAP_QUIET)
    } else {
        (CENTRALITY_K_BUSY, CENTRALITY_CAP_BUSY)
    };
    (centrality * 100.0 * k).round().min(cap) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ring::{ring_id, RingEvidence, RingRoles};
    use crate::core::Transaction;

    fn tx(id: &str, sender: &str, receiver: &str) -> Transaction {
        Transaction {
            tx_id: id.to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount: 100.0,
            timestamp_ms: 0,
        }
    }

    fn smurf_ring(pattern: RingPattern, members: &[&str], roles: RingRoles) -> Ring {
        Ring {
            id: ring_id("test"),
            pattern,
            members: members.iter().map(|m| m.to_string()).collect(),
            evidence: RingEvidence {
                tx_ids: vec![],
                start_ts: None,
                end_ts: None,
                hops: None,
                roles: Some(roles),
            },
            risk_score: 70,
        }
    }

    #[test]
    fn aggregator_outranks_sender() {
        let graph = FlowGraph::build(&[tx("T1", "S1", "R"), tx("T2", "S2", "R")]);
        let rings = vec![smurf_ring(
            RingPattern::Smurfing,
            &["S1", "S2", "R"],
            RingRoles {
                senders: vec!["S1".to_string(), "S2".to_string()],
                receivers: vec![],
            },
        )];
        let scored = score_accounts(&graph, &rings, &HashMap::new());
        let by_id: HashMap<&str, u8> = scored
            .iter()
            .map(|s| (s.account_id.as_str(), s.suspicion_score))
            .collect();
        assert_eq!(by_id["R"], 50);
        assert_eq!(by_id["S1"], 25);
        assert_eq!(by_id["S2"], 25);
    }

    #[test]
    fn dispersal_receiver_and_generic_sender() {
        let graph = FlowGraph::build(&[tx("T1", "D", "R1"), tx("T2", "D", "R2")]);
        let rings = vec![smurf_ring(
            RingPattern::Dispersal,
            &["D", "R1", "R2"],
            RingRoles {
                senders: vec![],
                receivers: vec!["R1".to_string(), "R2".to_string()],
            },
        )];
        let scored = score_accounts(&graph, &rings, &HashMap::new());
        let by_id: HashMap<&str, u8> = scored
            .iter()
            .map(|s| (s.account_id.as_str(), s.suspicion_score))
            .collect();
        // the dispersing sender has no role entry and falls to the generic bonus
        assert_eq!(by_id["D"], 25);
        assert_eq!(by_id["R1"], 10);
    }

    #[test]
    fn unflagged_account_scores_zero_despite_centrality() {
        let graph = FlowGraph::build(&[tx("T1", "A", "B"), tx("T2", "B", "C")]);
        let centrality: HashMap<String, f64> = [("B".to_string(), 1.0)].into();
        let scored = score_accounts(&graph, &[], &centrality);
        assert!(scored.iter().all(|s| s.suspicion_score == 0));
    }

    #[test]
    fn centrality_bonus_scales_with_degree() {
        assert_eq!(centrality_bonus(1.0, 2), 20);
        assert_eq!(centrality_bonus(1.0, 7), 10);
        assert_eq!(centrality_bonus(0.5, 2), 10);
        assert_eq!(centrality_bonus(0.0, 2), 0);
    }

    #[test]
    fn scores_clamp_at_one_hundred() {
        let graph = FlowGraph::build(&[tx("T1", "A", "B")]);
        let cycle = Ring {
            id: ring_id("c"),
            pattern: RingPattern::CircularRouting,
            members: vec!["A".to_string()],
            evidence: RingEvidence {
                tx_ids: vec![],
                start_ts: None,
                end_ts: None,
                hops: None,
                roles: None,
            },
            risk_score: 85,
        };
        let layer = Ring {
            id: ring_id("l"),
            pattern: RingPattern::LayeredShell,
            members: vec!["A".to_string()],
            evidence: RingEvidence {
                tx_ids: vec![],
                start_ts: None,
                end_ts: None,
                hops: None,
                roles: None,
            },
            risk_score: 80,
        };
        let smurf = smurf_ring(
            RingPattern::Smurfing,
            &["A"],
            RingRoles {
                senders: vec![],
                receivers: vec![],
            },
        );
        let centrality: HashMap<String, f64> = [("A".to_string(), 1.0)].into();
        let scored = score_accounts(&graph, &[cycle, layer, smurf], &centrality);
        let a = scored.iter().find(|s| s.account_id == "A").unwrap();
        // 45 + 40 + 50 + 20 caps at 100
        assert_eq!(a.suspicion_score, 100);
    }
}
