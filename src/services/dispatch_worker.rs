//! services/dispatch_worker.rs
//! Worker que consume la cola y reparte cada notificación a sus canales.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::{
    error::NotificationError,
    models::{
        notification_model::{NotificationRequest, QueueMessage},
        status_model::ChannelStatus,
    },
    services::{
        channel_registry::ChannelRegistry,
        queue_service::{Delivery, NotificationQueue},
        status_store::StatusStore,
    },
};

const RECEIVE_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct DispatchWorker {
    worker_id: usize,
    queue: Arc<dyn NotificationQueue>,
    store: Arc<dyn StatusStore>,
    registry: Arc<ChannelRegistry>,
}

impl DispatchWorker {
    pub fn new(
        worker_id: usize,
        queue: Arc<dyn NotificationQueue>,
        store: Arc<dyn StatusStore>,
        registry: Arc<ChannelRegistry>,
    ) -> Self {
        Self {
            worker_id,
            queue,
            store,
            registry,
        }
    }

    /// Loop principal. El shutdown solo se atiende entre mensajes; un mensaje
    /// ya recibido siempre se procesa hasta el final.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        log::info!("(run) Worker #{} iniciado", self.worker_id);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let delivery = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                received = self.queue.receive() => received,
            };

            match delivery {
                Ok(delivery) => self.handle_delivery(delivery).await,
                Err(e) => {
                    log::error!("(run) Worker #{} error recibiendo: {}", self.worker_id, e);
                    tokio::time::sleep(RECEIVE_BACKOFF).await;
                }
            }
        }

        log::info!("(run) Worker #{} detenido", self.worker_id);
    }

    /// Procesa una entrega y decide ack/nack. Solo una falla del status
    /// store deja el mensaje sin confirmar para que la cola lo reentregue.
    pub async fn handle_delivery(&self, delivery: Delivery) {
        let id = delivery.message.notification_id.clone();
        if delivery.attempt > 1 {
            log::info!(
                "(handle_delivery) Reentrega #{} de id={}",
                delivery.attempt,
                id
            );
        }

        let settled = match self.process_message(&delivery.message).await {
            Ok(()) => self.queue.ack(delivery.tag).await,
            Err(e) => {
                log::error!(
                    "(handle_delivery) id={} no se pudo completar, queda para reentrega: {}",
                    id,
                    e
                );
                self.queue.nack(delivery.tag).await
            }
        };

        if let Err(e) = settled {
            log::error!("(handle_delivery) Error confirmando id={}: {}", id, e);
        }
    }

    /// Recorre los canales en orden de request. Cada canal termina en
    /// COMPLETED o FAILED; las fallas de un canal no afectan a los demás.
    pub async fn process_message(&self, message: &QueueMessage) -> Result<(), NotificationError> {
        let id = &message.notification_id;
        let request = &message.request;

        log::info!(
            "(process_message) Procesando id={} canales={:?}",
            id,
            request.channels
        );

        for channel in request.distinct_channels() {
            self.store
                .update_channel(id, channel, ChannelStatus::Processing)
                .await?;

            let final_status = match self.deliver_channel(channel, request).await {
                Ok(()) => {
                    log::info!("(process_message) Canal '{}' de id={} enviado", channel, id);
                    ChannelStatus::Completed
                }
                Err(e) if e.is_channel_failure() => {
                    log::warn!("(process_message) Canal '{}' de id={} falló: {}", channel, id, e);
                    ChannelStatus::Failed
                }
                Err(e) => return Err(e),
            };

            self.store.update_channel(id, channel, final_status).await?;
        }

        log::info!("(process_message) Finalizado id={}", id);
        Ok(())
    }

    /// Envía a todos los destinatarios; se detiene en la primera falla.
    async fn deliver_channel(
        &self,
        channel: &str,
        request: &NotificationRequest,
    ) -> Result<(), NotificationError> {
        let adapter = self.registry.resolve(channel)?;

        for recipient in &request.recipient_ids {
            adapter
                .send(recipient, &request.message)
                .await
                .map_err(|e| NotificationError::Delivery {
                    channel: channel.to_string(),
                    recipient: recipient.clone(),
                    reason: format!("{e:#}"),
                })?;
        }
        Ok(())
    }
}
