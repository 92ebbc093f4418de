//! handlers/metrics_handler.rs
use actix_web::{web, HttpResponse};

use crate::{models::response_model::ApiResponse, services::metrics_service::MetricsService};

/// GET /api/metrics
pub async fn metrics_endpoint(metrics_service: web::Data<MetricsService>) -> HttpResponse {
    match metrics_service.snapshot().await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => {
            log::error!("(metrics_endpoint) Error calculando métricas: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(e.to_string()))
        }
    }
}
