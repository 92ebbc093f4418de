//! tests/handler_tests.rs
//! Rutas HTTP sobre servicios en memoria.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::{json, Value};

    use crate::app::init_app;
    use crate::services::dispatch_worker::DispatchWorker;
    use crate::services::metrics_service::MetricsService;
    use crate::services::notification_service::NotificationService;
    use crate::services::queue_service::{InMemoryQueue, NotificationQueue};
    use crate::services::status_store::{InMemoryStatusStore, StatusStore};
    use crate::services::webhook_service::WebhookService;
    use crate::tests::support::{as_adapter, registry_with, RecordingAdapter};

    struct Services {
        queue: Arc<InMemoryQueue>,
        notifications: NotificationService,
        webhooks: WebhookService,
        metrics: MetricsService,
        worker: DispatchWorker,
    }

    fn services() -> Services {
        let store: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());
        let queue = Arc::new(InMemoryQueue::new());
        let dyn_queue: Arc<dyn NotificationQueue> = queue.clone();
        let registry = registry_with(vec![
            as_adapter(&RecordingAdapter::new("email")),
            as_adapter(&RecordingAdapter::always_failing("sms")),
        ]);

        Services {
            notifications: NotificationService::new(store.clone(), dyn_queue.clone()),
            webhooks: WebhookService::new(store.clone()),
            metrics: MetricsService::new(store.clone()),
            worker: DispatchWorker::new(0, dyn_queue, store, registry),
            queue,
        }
    }

    macro_rules! app {
        ($s:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($s.notifications.clone()))
                    .app_data(web::Data::new($s.webhooks.clone()))
                    .app_data(web::Data::new($s.metrics.clone()))
                    .configure(init_app),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn test_post_notification_returns_accepted() {
        let s = services();
        let app = app!(s);

        let req = test::TestRequest::post()
            .uri("/api/notifications")
            .set_json(json!({
                "channels": ["email", "sms"],
                "recipient_ids": ["u1"],
                "message": "hola",
                "metadata": {"campaign": "otoño"}
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ENQUEUED");
        let id = body["data"]["notification_id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());
        assert_eq!(s.queue.pending_len().await, 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/notifications/{}/status", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let record: Value = test::read_body_json(resp).await;
        assert_eq!(record["overall_status"], "ENQUEUED");
        assert_eq!(record["channel_statuses"]["email"], "PENDING");
        assert_eq!(record["channel_statuses"]["sms"], "PENDING");
    }

    #[actix_rt::test]
    async fn test_post_invalid_notification_returns_bad_request() {
        let s = services();
        let app = app!(s);

        let req = test::TestRequest::post()
            .uri("/api/notifications")
            .set_json(json!({
                "channels": [],
                "recipient_ids": ["u1"],
                "message": "hola"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(s.queue.pending_len().await, 0);
    }

    #[actix_rt::test]
    async fn test_status_of_unknown_id_is_not_found() {
        let s = services();
        let app = app!(s);

        let req = test::TestRequest::get()
            .uri("/api/notifications/no-existe/status")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_webhook_callback_routes() {
        let s = services();
        let app = app!(s);

        let id = s
            .notifications
            .enqueue(crate::tests::support::request(&["email"], &["u1"], "hola"))
            .await
            .unwrap();

        let req = test::TestRequest::post()
            .uri("/api/webhooks/callback")
            .set_json(json!({
                "notification_id": id,
                "channel": "email",
                "status": "COMPLETED"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["status"], "updated");

        let record = s.notifications.get_status(&id).await.unwrap();
        assert_eq!(record.overall_status.as_str(), "COMPLETED");

        // falta el canal
        let req = test::TestRequest::post()
            .uri("/api/webhooks/callback")
            .set_json(json!({ "notification_id": id, "status": "FAILED" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    /// Flujo completo: POST, worker, estado final y métricas.
    #[actix_rt::test]
    async fn test_full_flow_reports_partial_failure_and_metrics() {
        let s = services();
        let app = app!(s);

        let req = test::TestRequest::post()
            .uri("/api/notifications")
            .set_json(json!({
                "channels": ["email", "sms"],
                "recipient_ids": ["u1", "u2"],
                "message": "hola"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["data"]["notification_id"].as_str().unwrap().to_string();

        let delivery = tokio::time::timeout(Duration::from_secs(1), s.queue.receive())
            .await
            .expect("mensaje en cola")
            .expect("receive");
        s.worker.handle_delivery(delivery).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/notifications/{}/status", id))
            .to_request();
        let record: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(record["overall_status"], "PARTIAL_FAILURE");
        assert_eq!(record["channel_statuses"]["email"], "COMPLETED");
        assert_eq!(record["channel_statuses"]["sms"], "FAILED");

        let req = test::TestRequest::get().uri("/api/metrics").to_request();
        let metrics: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(metrics["total"], 1);
        assert_eq!(metrics["completed"], 0);
        assert_eq!(metrics["failed"], 1);
        assert_eq!(metrics["by_status"]["PARTIAL_FAILURE"], 1);
    }
}
