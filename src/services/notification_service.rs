use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::NotificationError,
    models::{
        notification_model::{NotificationRequest, QueueMessage},
        status_model::StatusRecord,
    },
    services::{queue_service::NotificationQueue, status_store::StatusStore},
};

/// Ingesta de notificaciones y consulta de estado.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn StatusStore>,
    queue: Arc<dyn NotificationQueue>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn StatusStore>, queue: Arc<dyn NotificationQueue>) -> Self {
        Self { store, queue }
    }

    /// Valida, crea el registro de estado y publica en la cola.
    /// El registro se persiste antes de publicar: un worker nunca ve un
    /// mensaje cuyo estado no existe todavía.
    pub async fn enqueue(&self, request: NotificationRequest) -> Result<String, NotificationError> {
        request.validate()?;

        let id = Uuid::new_v4().to_string();
        log::info!(
            "(enqueue) Nueva notificación id={} canales={:?} destinatarios={}",
            id,
            request.channels,
            request.recipient_ids.len()
        );

        self.store.create(&id, &request.channels).await?;

        if let Err(e) = self.queue.publish(QueueMessage::new(id.clone(), request)).await {
            // el registro queda en ENQUEUED; reintentar la publicación es decisión externa
            log::error!("(enqueue) No se pudo publicar id={}: {}", id, e);
            return Err(e);
        }

        log::info!("(enqueue) id={} publicado en la cola", id);
        Ok(id)
    }

    pub async fn get_status(&self, id: &str) -> Result<StatusRecord, NotificationError> {
        self.store.get(id).await
    }
}
