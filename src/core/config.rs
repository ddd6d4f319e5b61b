use std::env;

pub const HOUR_MS: i64 = 3_600_000;

/// Detector thresholds for the analysis engine.
///
/// Injected into the engine at construction; identical values always
/// produce identical reports.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Sliding-window span for smurfing scans.
    pub window_ms: i64,
    /// Minimum distinct senders in a fan-in window.
    pub fan_in_unique_min: usize,
    /// Minimum distinct receivers in a fan-out window.
    pub fan_out_unique_min: usize,
    /// Upper bound for a "small" transfer amount.
    pub small_tx_amount: f64,
    /// Fraction of window senders that must include a small transfer.
    pub small_counterparty_ratio: f64,
    /// Span after a fan-in window in which outflow is checked.
    pub velocity_ms: i64,
    /// Outflow/inflow ratio that triggers the velocity bonus.
    pub velocity_out_ratio: f64,
    pub velocity_bonus: u8,
    pub cycle_min_len: usize,
    pub cycle_max_len: usize,
    /// Cycle detection is skipped above either cap.
    pub cycle_max_accounts: usize,
    pub cycle_max_transactions: usize,
    /// Maximum hops in a layered chain.
    pub layering_max_depth: usize,
    /// Maximum gap between consecutive chain transfers.
    pub layering_max_gap_ms: i64,
    pub layering_min_hops: usize,
    /// Total-degree ceiling for a "low-activity" account.
    pub low_activity_max_total: usize,
    /// Centrality degrades to zero above this account count.
    pub centrality_max_accounts: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            window_ms: 72 * HOUR_MS,
            fan_in_unique_min: 10,
            fan_out_unique_min: 10,
            small_tx_amount: 1_000.0,
            small_counterparty_ratio: 0.70,
            velocity_ms: 6 * HOUR_MS,
            velocity_out_ratio: 0.90,
            velocity_bonus: 15,
            cycle_min_len: 3,
            cycle_max_len: 5,
            cycle_max_accounts: 2_000,
            cycle_max_transactions: 200_000,
            layering_max_depth: 6,
            layering_max_gap_ms: 72 * HOUR_MS,
            layering_min_hops: 3,
            low_activity_max_total: 2,
            centrality_max_accounts: 2_000,
        }
    }
}

/// HTTP server settings, environment-driven with defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        ServerConfig {
            host: env::var("MULETRACE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("MULETRACE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            max_body_bytes: env::var("MULETRACE_MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(16 * 1024 * 1024),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let config = AnalysisConfig::default();
        assert_eq!(config.window_ms, 72 * HOUR_MS);
        assert_eq!(config.fan_in_unique_min, 10);
        assert_eq!(config.small_tx_amount, 1_000.0);
        assert_eq!(config.layering_max_depth, 6);
        assert_eq!(config.low_activity_max_total, 2);
    }
}
