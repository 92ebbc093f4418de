//! app.rs
use crate::handlers::{metrics_handler, notification_handler, webhook_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/notifications")
                    .route(
                        "",
                        web::post().to(notification_handler::send_notification_endpoint),
                    )
                    .route(
                        "/{id}/status",
                        web::get().to(notification_handler::notification_status_endpoint),
                    ),
            )
            .route("/metrics", web::get().to(metrics_handler::metrics_endpoint))
            .service(
                web::scope("/webhooks").route(
                    "/callback",
                    web::post().to(webhook_handler::webhook_callback_endpoint),
                ),
            ),
    );
}
