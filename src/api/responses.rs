/// Export Serialization
/// Builds the downloadable report document from an analysis result
use crate::analysis::{AnalysisReport, Ring};
use crate::core::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportAccount {
    pub account_id: String,
    pub suspicion_score: f64,
    pub detected_patterns: Vec<String>,
    pub ring_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRing {
    pub ring_id: String,
    pub pattern: String,
    pub involved_accounts: Vec<String>,
    pub total_amount: f64,
    pub risk_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub suspicious_accounts: Vec<ExportAccount>,
    pub fraud_rings: Vec<ExportRing>,
    pub summary: ExportSummary,
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Assemble the export document: display labels, evidence-summed ring
/// totals, fixed-precision scores. `processing_seconds` is measured by the
/// caller around the engine run.
pub fn build_export(
    report: &AnalysisReport,
    transactions: &[Transaction],
    processing_seconds: f64,
) -> ExportDocument {
    let amounts: HashMap<&str, f64> = transactions
        .iter()
        .map(|t| (t.tx_id.as_str(), t.amount))
        .collect();

    // rings are ordered risk desc / id asc, so the first hit per account
    // is its highest-risk ring
    let mut best_ring: HashMap<&str, &Ring> = HashMap::new();
    let mut account_patterns: HashMap<&str, Vec<&'static str>> = HashMap::new();
    for ring in &report.report.fraud_rings {
        for member in &ring.members {
            best_ring.entry(member.as_str()).or_insert(ring);
            let labels = account_patterns.entry(member.as_str()).or_default();
            if !labels.contains(&ring.pattern.label()) {
                labels.push(ring.pattern.label());
            }
        }
    }

    let suspicious_accounts = report
        .report
        .suspicious_accounts
        .iter()
        .map(|account| {
            // flags and patterns derive from the same ring list, so every
            // suspicious account has at least one ring label
            let detected_patterns = account_patterns
                .get(account.account_id.as_str())
                .map(|labels| labels.iter().map(|l| l.to_string()).collect())
                .unwrap_or_default();
            ExportAccount {
                account_id: account.account_id.clone(),
                suspicion_score: round_to(f64::from(account.suspicion_score), 1),
                detected_patterns,
                ring_id: best_ring
                    .get(account.account_id.as_str())
                    .map(|ring| ring.id.clone())
                    .unwrap_or_default(),
            }
        })
        .collect();

    let fraud_rings = report
        .report
        .fraud_rings
        .iter()
        .map(|ring| {
            let total: f64 = ring
                .evidence
                .tx_ids
                .iter()
                .map(|id| amounts.get(id.as_str()).copied().unwrap_or(0.0))
                .sum();
            ExportRing {
                ring_id: ring.id.clone(),
                pattern: ring.pattern.label().to_string(),
                involved_accounts: ring.members.clone(),
                total_amount: round_to(total, 2),
                risk_score: round_to(f64::from(ring.risk_score), 1),
            }
        })
        .collect();

    ExportDocument {
        suspicious_accounts,
        fraud_rings,
        summary: ExportSummary {
            total_accounts_analyzed: report.graph.nodes.len(),
            suspicious_accounts_flagged: report.report.suspicious_accounts.len(),
            fraud_rings_detected: report.report.fraud_rings.len(),
            processing_time_seconds: round_to(processing_seconds, 3),
        },
    }
}
