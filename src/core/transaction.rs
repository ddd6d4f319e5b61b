use serde::{Deserialize, Serialize};

/// A validated directed transfer between two accounts.
///
/// `tx_id` is unique across the input (the loader enforces this),
/// `amount` is finite and non-negative, `timestamp_ms` is a millisecond
/// epoch. Self-transfers are legal input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: String,
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub timestamp_ms: i64,
}

impl Transaction {
    pub fn is_self_transfer(&self) -> bool {
        self.sender == self.receiver
    }
}
