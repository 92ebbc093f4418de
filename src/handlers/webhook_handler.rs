//! handlers/webhook_handler.rs
use actix_web::{web, HttpResponse};

use crate::{
    error::NotificationError,
    models::{
        response_model::ApiResponse,
        webhook_model::{WebhookPayload, WebhookResponse},
    },
    services::webhook_service::WebhookService,
};

/// POST /api/webhooks/callback
pub async fn webhook_callback_endpoint(
    body: web::Json<WebhookPayload>,
    webhook_service: web::Data<WebhookService>,
) -> HttpResponse {
    match webhook_service.apply_payload(&body).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::success(
            "Callback applied",
            WebhookResponse {
                status: "updated".to_string(),
            },
        )),
        Err(e @ NotificationError::InvalidPayload(_)) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string()))
        }
        Err(e) => {
            log::error!("(webhook_callback_endpoint) Error aplicando callback: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(e.to_string()))
        }
    }
}
