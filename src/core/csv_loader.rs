use crate::core::errors::{TraceError, TraceResult};
use crate::core::transaction::Transaction;
use crate::metrics::{PARSE_ERRORS, TRANSACTIONS_PARSED};
/// CSV Transaction Loader
/// Parses uploaded transaction CSVs into validated transaction lists
use chrono::DateTime;
use std::collections::HashSet;

/// Result of a parse pass over one CSV document.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub transactions: Vec<Transaction>,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

pub struct CsvLoader;

impl CsvLoader {
    /// Parse CSV text with columns `tx_id,sender,receiver,amount,timestamp`.
    ///
    /// Invalid rows are skipped and counted, never fatal; only a missing
    /// header column aborts the parse. Duplicate tx_ids are rejected here
    /// so the engine can rely on uniqueness.
    pub fn parse(input: &str) -> TraceResult<ParseOutcome> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(input.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| TraceError::Csv(e.to_string()))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let (tx_col, sender_col, receiver_col, amount_col, ts_col) = match (
            column("tx_id"),
            column("sender"),
            column("receiver"),
            column("amount"),
            column("timestamp"),
        ) {
            (Some(a), Some(b), Some(c), Some(d), Some(e)) => (a, b, c, d, e),
            _ => {
                return Err(TraceError::Csv(
                    "missing required columns: tx_id,sender,receiver,amount,timestamp".to_string(),
                ))
            }
        };

        let mut outcome = ParseOutcome::default();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for (idx, record) in reader.records().enumerate() {
            outcome.rows_read += 1;
            let row = idx + 2; // 1-based, after the header line
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    skip_row(&mut outcome, row, "malformed", &e.to_string());
                    continue;
                }
            };

            let field = |col: usize| record.get(col).unwrap_or("");
            let tx_id = field(tx_col);
            let sender = field(sender_col);
            let receiver = field(receiver_col);
            if tx_id.is_empty() || sender.is_empty() || receiver.is_empty() {
                skip_row(&mut outcome, row, "missing_field", "empty tx_id/sender/receiver");
                continue;
            }

            let amount = match field(amount_col).parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => {
                    skip_row(&mut outcome, row, "bad_amount", field(amount_col));
                    continue;
                }
            };

            let timestamp_ms = match parse_timestamp(field(ts_col)) {
                Some(ts) => ts,
                None => {
                    skip_row(&mut outcome, row, "bad_timestamp", field(ts_col));
                    continue;
                }
            };

            if !seen_ids.insert(tx_id.to_string()) {
                skip_row(&mut outcome, row, "duplicate_id", tx_id);
                continue;
            }

            outcome.transactions.push(Transaction {
                tx_id: tx_id.to_string(),
                sender: sender.to_string(),
                receiver: receiver.to_string(),
                amount,
                timestamp_ms,
            });
        }

        TRANSACTIONS_PARSED.inc_by(outcome.transactions.len() as f64);
        Ok(outcome)
    }
}

/// Accepts a millisecond epoch integer or an RFC 3339 datetime.
fn parse_timestamp(raw: &str) -> Option<i64> {
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

fn skip_row(outcome: &mut ParseOutcome, row: usize, error_type: &str, detail: &str) {
    outcome.rows_skipped += 1;
    PARSE_ERRORS.with_label_values(&[error_type]).inc();
    let error = TraceError::InvalidInputRow {
        row,
        reason: format!("{} ({})", error_type, detail),
    };
    tracing::warn!("{}", error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_rows() {
        let input = "tx_id,sender,receiver,amount,timestamp\n\
                     T1,A,B,100.5,1700000000000\n\
                     T2,B,C,50,1700000001000\n";
        let outcome = CsvLoader::parse(input).unwrap();
        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.rows_read, 2);
        assert_eq!(outcome.rows_skipped, 0);
        assert_eq!(outcome.transactions[0].tx_id, "T1");
        assert_eq!(outcome.transactions[0].amount, 100.5);
        assert_eq!(outcome.transactions[0].timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn accepts_rfc3339_timestamps() {
        let input = "tx_id,sender,receiver,amount,timestamp\n\
                     T1,A,B,10,2024-01-01T00:00:00Z\n";
        let outcome = CsvLoader::parse(input).unwrap();
        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.transactions[0].timestamp_ms, 1_704_067_200_000);
    }

    #[test]
    fn skips_invalid_rows() {
        let input = "tx_id,sender,receiver,amount,timestamp\n\
                     T1,A,B,abc,1700000000000\n\
                     T2,A,,50,1700000000000\n\
                     T3,A,B,-5,1700000000000\n\
                     T4,A,B,50,not-a-time\n\
                     T5,A,B,50,1700000000000\n";
        let outcome = CsvLoader::parse(input).unwrap();
        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.transactions[0].tx_id, "T5");
        assert_eq!(outcome.rows_skipped, 4);
    }

    #[test]
    fn rejects_duplicate_tx_ids() {
        let input = "tx_id,sender,receiver,amount,timestamp\n\
                     T1,A,B,10,1\n\
                     T1,C,D,20,2\n";
        let outcome = CsvLoader::parse(input).unwrap();
        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.transactions[0].sender, "A");
        assert_eq!(outcome.rows_skipped, 1);
    }

    #[test]
    fn missing_column_is_fatal() {
        let input = "tx_id,sender,amount,timestamp\nT1,A,10,1\n";
        assert!(CsvLoader::parse(input).is_err());
    }
}
