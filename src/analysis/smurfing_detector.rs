/// Smurfing Detector
/// Fan-in aggregation and fan-out dispersal over sliding time windows
use crate::analysis::graph_builder::{AdjEntry, FlowGraph};
use crate::analysis::ring::{ring_id, Ring, RingEvidence, RingPattern, RingRoles};
use crate::core::AnalysisConfig;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    FanIn,
    FanOut,
}

/// Counterparty bookkeeping for the active window.
#[derive(Default)]
struct Window {
    freq: HashMap<String, usize>,
    small: HashMap<String, usize>,
    amount_sum: f64,
}

impl Window {
    fn add(&mut self, entry: &AdjEntry, small_max: f64) {
        *self.freq.entry(entry.peer.clone()).or_insert(0) += 1;
        if entry.amount <= small_max {
            *self.small.entry(entry.peer.clone()).or_insert(0) += 1;
        }
        self.amount_sum += entry.amount;
    }

    fn remove(&mut self, entry: &AdjEntry, small_max: f64) {
        if let Some(count) = self.freq.get_mut(&entry.peer) {
            *count -= 1;
            if *count == 0 {
                self.freq.remove(&entry.peer);
            }
        }
        if entry.amount <= small_max {
            if let Some(count) = self.small.get_mut(&entry.peer) {
                *count -= 1;
                if *count == 0 {
                    self.small.remove(&entry.peer);
                }
            }
        }
        self.amount_sum -= entry.amount;
    }

    fn distinct(&self) -> usize {
        self.freq.len()
    }

    /// Fraction of counterparties whose window contribution includes at
    /// least one small transfer.
    fn small_ratio(&self) -> f64 {
        if self.freq.is_empty() {
            return 0.0;
        }
        let with_small = self
            .freq
            .keys()
            .filter(|peer| self.small.contains_key(*peer))
            .count();
        with_small as f64 / self.freq.len() as f64
    }
}

pub struct SmurfingDetector<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> SmurfingDetector<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// At most one fan-in and one fan-out ring per account: the first
    /// qualifying window in each direction wins, then the scan stops.
    pub fn detect(&self, graph: &FlowGraph) -> Vec<Ring> {
        let mut rings = Vec::new();
        for account in graph.accounts_sorted() {
            if let Some(ring) = self.scan(graph, account, Direction::FanIn) {
                rings.push(ring);
            }
            if let Some(ring) = self.scan(graph, account, Direction::FanOut) {
                rings.push(ring);
            }
        }
        rings
    }

    fn scan(&self, graph: &FlowGraph, account: &str, direction: Direction) -> Option<Ring> {
        // self-transfers are not counterparties
        let list: Vec<&AdjEntry> = match direction {
            Direction::FanIn => graph.incoming(account),
            Direction::FanOut => graph.outgoing(account),
        }
        .iter()
        .filter(|entry| entry.peer != account)
        .collect();

        if list.len() < self.unique_min(direction) {
            return None;
        }

        let mut window = Window::default();
        let mut left = 0usize;
        for right in 0..list.len() {
            if list[right].ts - list[left].ts > self.config.window_ms {
                // the window is at its widest; evaluate before contracting
                if let Some(ring) =
                    self.evaluate(graph, account, direction, &list[left..right], &window)
                {
                    return Some(ring);
                }
                while list[right].ts - list[left].ts > self.config.window_ms {
                    window.remove(list[left], self.config.small_tx_amount);
                    left += 1;
                }
            }
            window.add(list[right], self.config.small_tx_amount);
        }
        self.evaluate(graph, account, direction, &list[left..], &window)
    }

    fn evaluate(
        &self,
        graph: &FlowGraph,
        account: &str,
        direction: Direction,
        entries: &[&AdjEntry],
        window: &Window,
    ) -> Option<Ring> {
        if entries.is_empty() || window.distinct() < self.unique_min(direction) {
            return None;
        }
        if direction == Direction::FanIn
            && window.small_ratio() < self.config.small_counterparty_ratio
        {
            return None;
        }

        let mut peers: Vec<String> = window.freq.keys().cloned().collect();
        peers.sort();
        let start_ts = entries.first().map(|e| e.ts)?;
        let end_ts = entries.last().map(|e| e.ts)?;

        let mut risk = 60 + window.distinct().min(20) as u8;
        let (pattern, members, roles) = match direction {
            Direction::FanIn => {
                risk = risk.saturating_add(self.velocity_bonus(
                    graph,
                    account,
                    end_ts,
                    window.amount_sum,
                ));
                let mut members = peers.clone();
                members.push(account.to_string());
                let roles = RingRoles {
                    senders: peers.clone(),
                    receivers: vec![],
                };
                (RingPattern::Smurfing, members, roles)
            }
            Direction::FanOut => {
                let mut members = vec![account.to_string()];
                members.extend(peers.iter().cloned());
                let roles = RingRoles {
                    senders: vec![],
                    receivers: peers.clone(),
                };
                (RingPattern::Dispersal, members, roles)
            }
        };

        let identity = format!(
            "smurf|{}|{}|{}|{}",
            account,
            peers.join(","),
            start_ts,
            end_ts
        );
        Some(Ring {
            id: ring_id(&identity),
            pattern,
            members,
            evidence: RingEvidence {
                tx_ids: entries.iter().map(|e| e.tx_id.clone()).collect(),
                start_ts: Some(start_ts),
                end_ts: Some(end_ts),
                hops: None,
                roles: Some(roles),
            },
            risk_score: risk,
        })
    }

    /// Rapid disbursement after a fan-in window raises the ring score.
    fn velocity_bonus(&self, graph: &FlowGraph, account: &str, end_ts: i64, in_sum: f64) -> u8 {
        if in_sum <= 0.0 {
            return 0;
        }
        let horizon = end_ts + self.config.velocity_ms;
        let out_sum: f64 = graph
            .outgoing(account)
            .iter()
            .filter(|e| e.ts >= end_ts && e.ts <= horizon)
            .map(|e| e.amount)
            .sum();
        if out_sum / in_sum >= self.config.velocity_out_ratio {
            self.config.velocity_bonus
        } else {
            0
        }
    }

    fn unique_min(&self, direction: Direction) -> usize {
        match direction {
            Direction::FanIn => self.config.fan_in_unique_min,
            Direction::FanOut => self.config.fan_out_unique_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::HOUR_MS;
    use crate::core::Transaction;

    fn tx(id: &str, sender: &str, receiver: &str, amount: f64, ts_hours: i64) -> Transaction {
        Transaction {
            tx_id: id.to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            timestamp_ms: ts_hours * HOUR_MS,
        }
    }

    fn detect(transactions: &[Transaction]) -> Vec<Ring> {
        let config = AnalysisConfig::default();
        let graph = FlowGraph::build(transactions);
        SmurfingDetector::new(&config).detect(&graph)
    }

    fn fan_in_input(sender_count: usize, amount: f64) -> Vec<Transaction> {
        (0..sender_count)
            .map(|i| {
                tx(
                    &format!("T{:02}", i),
                    &format!("S{:02}", i),
                    "R",
                    amount,
                    i as i64,
                )
            })
            .collect()
    }

    #[test]
    fn detects_fan_in_with_small_transfers() {
        let rings = detect(&fan_in_input(12, 900.0));
        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring.pattern, RingPattern::Smurfing);
        // window holds all 12 senders
        assert_eq!(ring.risk_score, 72);
        assert_eq!(ring.members.len(), 13);
        assert_eq!(ring.members.last().unwrap(), "R");
        let roles = ring.evidence.roles.as_ref().unwrap();
        assert_eq!(roles.senders.len(), 12);
        assert!(roles.receivers.is_empty());
    }

    #[test]
    fn fan_in_requires_small_counterparty_ratio() {
        // every transfer well above the small-tx bound
        let rings = detect(&fan_in_input(12, 5_000.0));
        assert!(rings.is_empty());
    }

    #[test]
    fn fan_in_below_unique_minimum_is_ignored() {
        let rings = detect(&fan_in_input(9, 900.0));
        assert!(rings.is_empty());
    }

    #[test]
    fn velocity_bonus_applies_on_rapid_disbursement() {
        let mut input = fan_in_input(12, 900.0);
        // 12 * 900 = 10_800 in; 10_000 out within six hours of the window end
        input.push(tx("OUT", "R", "X", 10_000.0, 12));
        let rings = detect(&input);
        let fan_in = rings
            .iter()
            .find(|r| r.pattern == RingPattern::Smurfing)
            .unwrap();
        assert_eq!(fan_in.risk_score, 72 + 15);
    }

    #[test]
    fn slow_disbursement_earns_no_bonus() {
        let mut input = fan_in_input(12, 900.0);
        input.push(tx("OUT", "R", "X", 10_000.0, 48));
        let rings = detect(&input);
        let fan_in = rings
            .iter()
            .find(|r| r.pattern == RingPattern::Smurfing)
            .unwrap();
        assert_eq!(fan_in.risk_score, 72);
    }

    #[test]
    fn detects_fan_out_without_small_gate() {
        let input: Vec<Transaction> = (0..11)
            .map(|i| {
                tx(
                    &format!("T{:02}", i),
                    "D",
                    &format!("R{:02}", i),
                    5_000.0,
                    i as i64,
                )
            })
            .collect();
        let rings = detect(&input);
        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring.pattern, RingPattern::Dispersal);
        assert_eq!(ring.risk_score, 71);
        assert_eq!(ring.members[0], "D");
        assert_eq!(ring.members.len(), 12);
        let roles = ring.evidence.roles.as_ref().unwrap();
        assert!(roles.senders.is_empty());
        assert_eq!(roles.receivers.len(), 11);
    }

    #[test]
    fn first_qualifying_window_wins() {
        // 12 early senders, then a gap past the window, then 5 more
        let mut input = fan_in_input(12, 900.0);
        for i in 0..5 {
            input.push(tx(
                &format!("L{}", i),
                &format!("Z{}", i),
                "R",
                900.0,
                100 + i,
            ));
        }
        let rings = detect(&input);
        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        // only the first maximal window is reported
        assert_eq!(ring.evidence.roles.as_ref().unwrap().senders.len(), 12);
        assert_eq!(ring.evidence.end_ts, Some(11 * HOUR_MS));
    }

    #[test]
    fn self_transfers_are_not_counterparties() {
        let mut input = fan_in_input(9, 900.0);
        input.push(tx("SELF", "R", "R", 900.0, 5));
        let rings = detect(&input);
        assert!(rings.is_empty());
    }
}
