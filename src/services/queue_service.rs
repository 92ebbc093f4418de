//! services/queue_service.rs
//! Cola entre la ingesta y los workers de despacho.
//!
//! Entrega al-menos-una-vez: un mensaje recibido queda "en vuelo" hasta que el
//! consumidor hace `ack`; con `nack` vuelve al frente de la cola y no se
//! reentrega hasta que pase su backoff exponencial. Mientras una llave tenga un
//! mensaje en vuelo o esperando backoff, ningún otro mensaje con esa llave se
//! entrega.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::error::NotificationError;
use crate::models::notification_model::QueueMessage;

pub type DeliveryTag = u64;

/// Un mensaje entregado a un consumidor, pendiente de ack/nack.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub tag: DeliveryTag,
    pub message: QueueMessage,
    /// 1 en la primera entrega, >1 en reentregas
    pub attempt: u32,
}

#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn publish(&self, message: QueueMessage) -> Result<(), NotificationError>;

    /// Bloquea hasta que haya un mensaje entregable.
    async fn receive(&self) -> Result<Delivery, NotificationError>;

    async fn ack(&self, tag: DeliveryTag) -> Result<(), NotificationError>;

    /// Devuelve el mensaje a la cola para que se reentregue.
    async fn nack(&self, tag: DeliveryTag) -> Result<(), NotificationError>;
}

/// Entrada en formato de cable: llave + request serializado.
#[derive(Debug, Clone)]
struct Envelope {
    key: String,
    value: String,
    attempt: u32,
    /// Antes de este instante el mensaje no se entrega (backoff tras nack)
    retry_at: Option<Instant>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Envelope>,
    in_flight: HashMap<DeliveryTag, Envelope>,
    busy_keys: HashSet<String>,
    next_tag: DeliveryTag,
}

const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(100);
const DEFAULT_RETRY_MAX: Duration = Duration::from_secs(30);

pub struct InMemoryQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    retry_base: Duration,
    retry_max: Duration,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::with_retry_backoff(DEFAULT_RETRY_BASE, DEFAULT_RETRY_MAX)
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backoff de reentrega: `base * 2^(intento-1)`, con tope `max`.
    pub fn with_retry_backoff(base: Duration, max: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            retry_base: base,
            retry_max: max,
        }
    }

    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.retry_base
            .saturating_mul(1u32 << exp)
            .min(self.retry_max)
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    /// Saca el primer mensaje entregable: su llave no está en vuelo y no hay un
    /// mensaje anterior de la misma llave esperando backoff. Si no hay ninguno,
    /// devuelve el instante más próximo en que uno queda listo.
    /// Los payloads que no se pueden decodificar se descartan.
    async fn try_take(&self) -> Result<Delivery, Option<Instant>> {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        loop {
            let (position, next_ready) = {
                let mut waiting_keys: HashSet<&str> = HashSet::new();
                let mut next_ready: Option<Instant> = None;
                let mut position = None;

                for (i, env) in state.pending.iter().enumerate() {
                    if state.busy_keys.contains(&env.key)
                        || waiting_keys.contains(env.key.as_str())
                    {
                        continue;
                    }
                    match env.retry_at {
                        Some(at) if at > now => {
                            next_ready = Some(next_ready.map_or(at, |n| n.min(at)));
                            waiting_keys.insert(env.key.as_str());
                        }
                        _ => {
                            position = Some(i);
                            break;
                        }
                    }
                }
                (position, next_ready)
            };

            let Some(position) = position else {
                return Err(next_ready);
            };
            let Some(mut envelope) = state.pending.remove(position) else {
                return Err(next_ready);
            };
            envelope.attempt += 1;
            envelope.retry_at = None;

            let message = match QueueMessage::decode(&envelope.key, &envelope.value) {
                Ok(message) => message,
                Err(e) => {
                    log::error!("(receive) Mensaje descartado: {}", e);
                    continue;
                }
            };

            state.next_tag += 1;
            let tag = state.next_tag;
            let attempt = envelope.attempt;
            state.busy_keys.insert(envelope.key.clone());
            state.in_flight.insert(tag, envelope);

            return Ok(Delivery {
                tag,
                message,
                attempt,
            });
        }
    }

    async fn settle(&self, tag: DeliveryTag, requeue: bool) -> Result<(), NotificationError> {
        {
            let mut state = self.state.lock().await;
            let envelope = state
                .in_flight
                .remove(&tag)
                .ok_or_else(|| NotificationError::Queue(format!("delivery tag desconocido: {tag}")))?;
            state.busy_keys.remove(&envelope.key);
            if requeue {
                let mut envelope = envelope;
                let delay = self.retry_delay(envelope.attempt);
                log::debug!(
                    "(nack) id={} vuelve a la cola, reentrega en {:?}",
                    envelope.key,
                    delay
                );
                envelope.retry_at = Some(Instant::now() + delay);
                state.pending.push_front(envelope);
            }
        }
        // la llave quedó libre: otros consumidores pueden tener trabajo
        self.notify.notify_waiters();
        Ok(())
    }
}

#[async_trait]
impl NotificationQueue for InMemoryQueue {
    async fn publish(&self, message: QueueMessage) -> Result<(), NotificationError> {
        let envelope = Envelope {
            key: message.key().to_string(),
            value: message.encode_value()?,
            attempt: 0,
            retry_at: None,
        };
        self.state.lock().await.pending.push_back(envelope);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn receive(&self) -> Result<Delivery, NotificationError> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // registrarse antes de mirar el estado para no perder un aviso
            notified.as_mut().enable();

            match self.try_take().await {
                Ok(delivery) => return Ok(delivery),
                Err(Some(ready_at)) => {
                    tokio::select! {
                        _ = notified => {}
                        _ = tokio::time::sleep_until(ready_at) => {}
                    }
                }
                Err(None) => notified.await,
            }
        }
    }

    async fn ack(&self, tag: DeliveryTag) -> Result<(), NotificationError> {
        self.settle(tag, false).await
    }

    async fn nack(&self, tag: DeliveryTag) -> Result<(), NotificationError> {
        self.settle(tag, true).await
    }
}
