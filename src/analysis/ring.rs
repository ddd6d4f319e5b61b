/// Ring Model
/// Detected pattern instances, deterministic ids and member-set dedup
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Pattern variants a ring can be flagged under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingPattern {
    CircularRouting,
    Smurfing,
    Dispersal,
    LayeredShell,
}

impl RingPattern {
    /// Display label used in exported reports.
    pub fn label(&self) -> &'static str {
        match self {
            RingPattern::CircularRouting => "Circular Fund Routing",
            RingPattern::Smurfing => "Smurfing (Fan-in)",
            RingPattern::Dispersal => "Smurfing (Fan-out)",
            RingPattern::LayeredShell => "Layered Shell Network",
        }
    }

    /// Dedup precedence; the higher survives a shared member set.
    pub fn priority(&self) -> u8 {
        match self {
            RingPattern::CircularRouting => 4,
            RingPattern::Smurfing | RingPattern::Dispersal => 3,
            RingPattern::LayeredShell => 2,
        }
    }
}

/// Sender/receiver role metadata carried on smurfing rings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingRoles {
    pub senders: Vec<String>,
    pub receivers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingEvidence {
    pub tx_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hops: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<RingRoles>,
}

/// One detected pattern instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ring {
    pub id: String,
    pub pattern: RingPattern,
    pub members: Vec<String>,
    pub evidence: RingEvidence,
    pub risk_score: u8,
}

impl Ring {
    /// Sorted member set, the dedup key.
    pub fn member_set_key(&self) -> String {
        let mut members = self.members.clone();
        members.sort();
        members.dedup();
        members.join(",")
    }
}

/// Stable 128-bit hex digest of a pattern identity string. Re-running on
/// the same input always yields the same id.
pub fn ring_id(identity: &str) -> String {
    let digest = Sha256::digest(identity.as_bytes());
    hex::encode(&digest[..16])
}

/// Collapse rings sharing a member set, keeping the highest-priority
/// variant; risk score then ring id break ties. Survivors come back
/// ordered by risk score descending, ring id ascending.
pub fn dedup_rings(rings: Vec<Ring>) -> Vec<Ring> {
    let mut best: HashMap<String, Ring> = HashMap::new();
    for ring in rings {
        let key = ring.member_set_key();
        match best.get(&key) {
            Some(incumbent) if !outranks(&ring, incumbent) => {}
            _ => {
                best.insert(key, ring);
            }
        }
    }
    let mut survivors: Vec<Ring> = best.into_values().collect();
    survivors.sort_by(|a, b| {
        b.risk_score
            .cmp(&a.risk_score)
            .then_with(|| a.id.cmp(&b.id))
    });
    survivors
}

fn outranks(candidate: &Ring, incumbent: &Ring) -> bool {
    let candidate_key = (
        candidate.pattern.priority(),
        candidate.risk_score,
        std::cmp::Reverse(candidate.id.as_str()),
    );
    let incumbent_key = (
        incumbent.pattern.priority(),
        incumbent.risk_score,
        std::cmp::Reverse(incumbent.id.as_str()),
    );
    candidate_key > incumbent_key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(pattern: RingPattern, members: &[&str], risk: u8, seed: &str) -> Ring {
        Ring {
            id: ring_id(seed),
            pattern,
            members: members.iter().map(|m| m.to_string()).collect(),
            evidence: RingEvidence {
                tx_ids: vec![],
                start_ts: None,
                end_ts: None,
                hops: None,
                roles: None,
            },
            risk_score: risk,
        }
    }

    #[test]
    fn ids_are_stable_hex() {
        let a = ring_id("cycle|A,B,C");
        let b = ring_id("cycle|A,B,C");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, ring_id("cycle|A,B,D"));
    }

    #[test]
    fn higher_priority_pattern_survives() {
        let survivors = dedup_rings(vec![
            ring(RingPattern::LayeredShell, &["A", "B", "C", "D"], 80, "layer"),
            ring(RingPattern::CircularRouting, &["D", "C", "B", "A"], 90, "cycle"),
        ]);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].pattern, RingPattern::CircularRouting);
    }

    #[test]
    fn risk_breaks_priority_ties() {
        let survivors = dedup_rings(vec![
            ring(RingPattern::Smurfing, &["A", "B"], 70, "low"),
            ring(RingPattern::Dispersal, &["B", "A"], 85, "high"),
        ]);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].risk_score, 85);
    }

    #[test]
    fn distinct_member_sets_both_survive_sorted() {
        let survivors = dedup_rings(vec![
            ring(RingPattern::Smurfing, &["A", "B"], 70, "one"),
            ring(RingPattern::Smurfing, &["C", "D"], 85, "two"),
        ]);
        assert_eq!(survivors.len(), 2);
        assert!(survivors[0].risk_score >= survivors[1].risk_score);
    }
}
