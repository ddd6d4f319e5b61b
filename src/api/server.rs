/// REST surface for the money-muling analysis engine.
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use serde_json::json;
use std::sync::Arc;

use crate::analysis::AnalysisEngine;
use crate::api::analysis_routes;
use crate::core::ServerConfig;
use crate::metrics;

/// Shared server state.
pub struct ApiState {
    pub engine: Arc<AnalysisEngine>,
}

pub async fn start_server(config: ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(ApiState {
        engine: Arc::new(AnalysisEngine::with_defaults()),
    });
    let max_body = config.max_body_bytes;

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_body))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .route("/", web::get().to(index))
            .route("/health", web::get().to(health_check))
            .route("/metrics", web::get().to(metrics_endpoint))
            .service(analysis_routes::analyze_report)
            .service(analysis_routes::analyze_export)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "service": "muletrace",
        "feature": "money-muling pattern analysis",
        "endpoints": {
            "health": "/health",
            "metrics": "/metrics",
            "report": "/api/v1/analysis/report",
            "export": "/api/v1/analysis/export"
        }
    }))
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /metrics - Prometheus metrics endpoint
async fn metrics_endpoint() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::gather_metrics())
}
