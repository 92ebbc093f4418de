//! tests/metrics_tests.rs

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use crate::models::status_model::{ChannelStatus, OverallStatus};
    use crate::services::metrics_service::MetricsService;
    use crate::services::status_store::{InMemoryStatusStore, StatusStore};

    #[actix_rt::test]
    async fn test_snapshot_counts() {
        let store = Arc::new(InMemoryStatusStore::new());
        let channels = vec!["email".to_string()];
        for id in ["a", "b", "c"] {
            store.create(id, &channels).await.unwrap();
        }
        store
            .update_channel("a", "email", ChannelStatus::Completed)
            .await
            .unwrap();
        store
            .update_channel("b", "email", ChannelStatus::Completed)
            .await
            .unwrap();
        store
            .update_channel("c", "email", ChannelStatus::Failed)
            .await
            .unwrap();

        let snapshot = MetricsService::new(store).snapshot().await.unwrap();

        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.completed, 2);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(
            snapshot.by_status,
            BTreeMap::from([
                (OverallStatus::Completed, 2),
                (OverallStatus::PartialFailure, 1),
            ])
        );
    }

    #[actix_rt::test]
    async fn test_empty_store_snapshot() {
        let store = Arc::new(InMemoryStatusStore::new());
        let snapshot = MetricsService::new(store).snapshot().await.unwrap();

        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.completed, 0);
        assert_eq!(snapshot.failed, 0);
        assert!(snapshot.by_status.is_empty());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = crate::models::metrics_model::MetricsSnapshot {
            total: 1,
            completed: 0,
            failed: 0,
            by_status: BTreeMap::from([(OverallStatus::Enqueued, 1)]),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["by_status"]["ENQUEUED"], 1);
        assert_eq!(json["total"], 1);
    }
}
