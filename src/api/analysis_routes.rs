use crate::analysis::{AnalysisEngine, AnalysisReport};
/// Analysis API Routes
/// CSV upload, full report and export endpoints
use crate::api::responses::{build_export, ExportDocument};
use crate::api::server::ApiState;
use crate::core::{CsvLoader, TraceError, Transaction};
use crate::metrics::{Timer, ANALYSES_TOTAL, ANALYSIS_DURATION, RINGS_DETECTED};
use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub success: bool,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub report: AnalysisReport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub rows_read: usize,
    pub rows_skipped: usize,
    #[serde(flatten)]
    pub document: ExportDocument,
}

struct Analyzed {
    transactions: Vec<Transaction>,
    rows_read: usize,
    rows_skipped: usize,
    report: AnalysisReport,
    elapsed_seconds: f64,
}

/// Run the engine over an uploaded CSV and return the graph report.
#[post("/api/v1/analysis/report")]
pub async fn analyze_report(body: String, state: web::Data<ApiState>) -> HttpResponse {
    match run_analysis(body, Arc::clone(&state.engine)).await {
        Ok(analyzed) => HttpResponse::Ok().json(ReportResponse {
            success: true,
            rows_read: analyzed.rows_read,
            rows_skipped: analyzed.rows_skipped,
            report: analyzed.report,
        }),
        Err(response) => response,
    }
}

/// Run the engine and return the downloadable export document.
#[post("/api/v1/analysis/export")]
pub async fn analyze_export(body: String, state: web::Data<ApiState>) -> HttpResponse {
    match run_analysis(body, Arc::clone(&state.engine)).await {
        Ok(analyzed) => {
            let document = build_export(
                &analyzed.report,
                &analyzed.transactions,
                analyzed.elapsed_seconds,
            );
            HttpResponse::Ok().json(ExportResponse {
                success: true,
                rows_read: analyzed.rows_read,
                rows_skipped: analyzed.rows_skipped,
                document,
            })
        }
        Err(response) => response,
    }
}

async fn run_analysis(body: String, engine: Arc<AnalysisEngine>) -> Result<Analyzed, HttpResponse> {
    let outcome = match CsvLoader::parse(&body) {
        Ok(outcome) => outcome,
        Err(e) => {
            return Err(HttpResponse::BadRequest().json(json!({
                "success": false,
                "error": e.to_string()
            })));
        }
    };
    if outcome.transactions.is_empty() {
        return Err(HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": TraceError::EmptyAnalysis.to_string(),
            "rows_read": outcome.rows_read,
            "rows_skipped": outcome.rows_skipped,
        })));
    }

    let timer = Timer::new();
    let transactions = outcome.transactions;
    // the engine is CPU-bound; keep it off the executor threads
    let result = web::block(move || {
        let report = engine.analyze(&transactions);
        (report, transactions)
    })
    .await;
    let (report, transactions) = match result {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("Analysis task failed: {}", e);
            return Err(HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": "analysis task failed"
            })));
        }
    };
    let elapsed_seconds = timer.elapsed_secs();

    ANALYSES_TOTAL.inc();
    ANALYSIS_DURATION.observe(elapsed_seconds);
    for ring in &report.report.fraud_rings {
        RINGS_DETECTED
            .with_label_values(&[ring.pattern.label()])
            .inc();
    }
    tracing::info!(
        "Analyzed {} transactions: {} suspicious accounts, {} rings in {:.3}s",
        transactions.len(),
        report.report.suspicious_accounts.len(),
        report.report.fraud_rings.len(),
        elapsed_seconds
    );

    Ok(Analyzed {
        transactions,
        rows_read: outcome.rows_read,
        rows_skipped: outcome.rows_skipped,
        report,
        elapsed_seconds,
    })
}
