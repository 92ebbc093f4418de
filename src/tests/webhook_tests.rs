//! tests/webhook_tests.rs

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::error::NotificationError;
    use crate::models::status_model::{ChannelStatus, OverallStatus};
    use crate::models::webhook_model::WebhookPayload;
    use crate::services::status_store::{InMemoryStatusStore, StatusStore};
    use crate::services::webhook_service::WebhookService;

    async fn setup() -> (Arc<InMemoryStatusStore>, WebhookService) {
        let store = Arc::new(InMemoryStatusStore::new());
        store
            .create("n-1", &["email".to_string(), "sms".to_string()])
            .await
            .unwrap();
        let service = WebhookService::new(store.clone());
        (store, service)
    }

    #[actix_rt::test]
    async fn test_callback_updates_channel_and_overall() {
        let (store, service) = setup().await;

        service
            .apply_callback("n-1", "email", "COMPLETED")
            .await
            .unwrap();
        service.apply_callback("n-1", "sms", "failed").await.unwrap();

        let record = store.get("n-1").await.unwrap();
        assert_eq!(record.channel_statuses["email"], ChannelStatus::Completed);
        assert_eq!(record.channel_statuses["sms"], ChannelStatus::Failed);
        assert_eq!(record.overall_status, OverallStatus::PartialFailure);
    }

    /// El último callback aplicado gana, incluso sobre un estado terminal.
    #[actix_rt::test]
    async fn test_last_applied_wins() {
        let (store, service) = setup().await;

        service.apply_callback("n-1", "sms", "FAILED").await.unwrap();
        service
            .apply_callback("n-1", "sms", "COMPLETED")
            .await
            .unwrap();

        let record = store.get("n-1").await.unwrap();
        assert_eq!(record.channel_statuses["sms"], ChannelStatus::Completed);
        assert_eq!(record.overall_status, OverallStatus::Processing);
    }

    #[actix_rt::test]
    async fn test_unknown_notification_is_silently_dropped() {
        let (store, service) = setup().await;

        service
            .apply_callback("expired", "email", "COMPLETED")
            .await
            .expect("unknown id must be a no-op");

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.values().sum::<u64>(), 1);
    }

    #[actix_rt::test]
    async fn test_invalid_payload_is_rejected_without_changes() {
        let (store, service) = setup().await;
        let before = store.get("n-1").await.unwrap();

        let cases = [
            WebhookPayload {
                notification_id: None,
                channel: Some("email".into()),
                status: Some("COMPLETED".into()),
            },
            WebhookPayload {
                notification_id: Some("n-1".into()),
                channel: Some("   ".into()),
                status: Some("COMPLETED".into()),
            },
            WebhookPayload {
                notification_id: Some("n-1".into()),
                channel: Some("email".into()),
                status: None,
            },
            WebhookPayload {
                notification_id: Some("n-1".into()),
                channel: Some("email".into()),
                status: Some("DELIVERED".into()),
            },
        ];

        for payload in &cases {
            let err = service.apply_payload(payload).await.unwrap_err();
            assert!(
                matches!(err, NotificationError::InvalidPayload(_)),
                "payload {:?} debería ser inválido",
                payload
            );
        }

        assert_eq!(store.get("n-1").await.unwrap(), before);
    }
}
