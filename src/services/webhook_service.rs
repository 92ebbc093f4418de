use std::sync::Arc;

use crate::{
    error::NotificationError,
    models::{status_model::ChannelStatus, webhook_model::WebhookPayload},
    services::status_store::StatusStore,
};

/// Aplica los resultados que reportan los proveedores externos.
/// Escribe sobre el mismo registro que los workers, sin orden entre ambos:
/// el último estado aplicado gana.
#[derive(Clone)]
pub struct WebhookService {
    store: Arc<dyn StatusStore>,
}

impl WebhookService {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    pub async fn apply_callback(
        &self,
        notification_id: &str,
        channel: &str,
        reported_status: &str,
    ) -> Result<(), NotificationError> {
        let notification_id = required("notification_id", Some(notification_id))?;
        let channel = required("channel", Some(channel))?;
        let reported_status = required("status", Some(reported_status))?;

        let status = reported_status
            .parse::<ChannelStatus>()
            .map_err(NotificationError::InvalidPayload)?;

        log::info!(
            "(apply_callback) id={} canal='{}' estado={}",
            notification_id,
            channel,
            status
        );
        self.store
            .update_channel(notification_id, channel, status)
            .await
    }

    /// Igual que `apply_callback` pero a partir del payload crudo del webhook.
    pub async fn apply_payload(&self, payload: &WebhookPayload) -> Result<(), NotificationError> {
        let notification_id = required("notification_id", payload.notification_id.as_deref())?;
        let channel = required("channel", payload.channel.as_deref())?;
        let status = required("status", payload.status.as_deref())?;

        self.apply_callback(notification_id, channel, status).await
    }
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, NotificationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(NotificationError::InvalidPayload(format!(
            "missing required field '{field}'"
        ))),
    }
}
