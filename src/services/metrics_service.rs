use std::sync::Arc;

use crate::{
    error::NotificationError,
    models::{metrics_model::MetricsSnapshot, status_model::OverallStatus},
    services::status_store::StatusStore,
};

/// Métricas derivadas del status store, sin efectos secundarios.
#[derive(Clone)]
pub struct MetricsService {
    store: Arc<dyn StatusStore>,
}

impl MetricsService {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    pub async fn snapshot(&self) -> Result<MetricsSnapshot, NotificationError> {
        let by_status = self.store.count_by_status().await?;

        let count_of = |status: OverallStatus| by_status.get(&status).copied().unwrap_or(0);

        let total = by_status.values().sum();
        let completed = count_of(OverallStatus::Completed);
        let failed = count_of(OverallStatus::PartialFailure);

        Ok(MetricsSnapshot {
            total,
            completed,
            failed,
            by_status,
        })
    }
}
