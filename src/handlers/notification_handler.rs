//! handlers/notification_handler.rs
use actix_web::{web, HttpResponse};

use crate::{
    error::NotificationError,
    models::{
        notification_model::{EnqueueResponse, NotificationRequest},
        response_model::ApiResponse,
        status_model::OverallStatus,
    },
    services::notification_service::NotificationService,
};

/// POST /api/notifications
pub async fn send_notification_endpoint(
    body: web::Json<NotificationRequest>,
    notification_service: web::Data<NotificationService>,
) -> HttpResponse {
    match notification_service.enqueue(body.into_inner()).await {
        Ok(notification_id) => HttpResponse::Accepted().json(ApiResponse::success(
            "Notification queued for async processing",
            EnqueueResponse {
                notification_id,
                status: OverallStatus::Enqueued.as_str().to_string(),
            },
        )),
        Err(e @ NotificationError::InvalidRequest(_)) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string()))
        }
        Err(e) => {
            log::error!("(send_notification_endpoint) Error encolando: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(e.to_string()))
        }
    }
}

/// GET /api/notifications/{id}/status
pub async fn notification_status_endpoint(
    path: web::Path<String>,
    notification_service: web::Data<NotificationService>,
) -> HttpResponse {
    let id = path.into_inner();

    match notification_service.get_status(&id).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e @ NotificationError::NotFound(_)) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(e.to_string()))
        }
        Err(e) => {
            log::error!("(notification_status_endpoint) Error consultando {}: {}", id, e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(e.to_string()))
        }
    }
}
