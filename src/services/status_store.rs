//! services/status_store.rs
//! Contrato del almacén de estados y la implementación en memoria.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::NotificationError;
use crate::models::status_model::{ChannelStatus, OverallStatus, StatusRecord};

/// Almacén durable de `StatusRecord` por id de notificación.
///
/// `update_channel` es la única forma de mutar un registro: carga, aplica el
/// estado del canal, recalcula el agregado y persiste como una sola unidad
/// respecto de otros llamadores sobre el mismo id.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn create(
        &self,
        id: &str,
        channels: &[String],
    ) -> Result<StatusRecord, NotificationError>;

    async fn get(&self, id: &str) -> Result<StatusRecord, NotificationError>;

    /// Ids o canales desconocidos no son error: se ignoran.
    async fn update_channel(
        &self,
        id: &str,
        channel: &str,
        status: ChannelStatus,
    ) -> Result<(), NotificationError>;

    /// Conteo de registros por estado agregado, como una foto en un instante.
    async fn count_by_status(&self) -> Result<BTreeMap<OverallStatus, u64>, NotificationError>;
}

/// Un registro sin canales no tiene estado agregado definido; se rechaza
/// en todos los backends antes de persistir.
pub(crate) fn ensure_channels(id: &str, channels: &[String]) -> Result<(), NotificationError> {
    if channels.is_empty() {
        return Err(NotificationError::InvalidRequest(format!(
            "notification {id} needs at least one channel"
        )));
    }
    Ok(())
}

/// Store en memoria. Cada registro tiene su propio mutex, así dos escritores
/// sobre el mismo id se serializan y sobre ids distintos no se bloquean.
///
/// `counts` lleva el conteo por estado agregado. Se ajusta mientras se tiene
/// el lock del registro que cambió, así `count_by_status` lee un conteo
/// coherente sin recorrer los registros.
#[derive(Default)]
pub struct InMemoryStatusStore {
    records: RwLock<HashMap<String, Arc<Mutex<StatusRecord>>>>,
    counts: Mutex<BTreeMap<OverallStatus, u64>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn record_lock(&self, id: &str) -> Option<Arc<Mutex<StatusRecord>>> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn create(
        &self,
        id: &str,
        channels: &[String],
    ) -> Result<StatusRecord, NotificationError> {
        ensure_channels(id, channels)?;

        let mut records = self.records.write().await;
        if records.contains_key(id) {
            return Err(NotificationError::AlreadyExists(id.to_string()));
        }

        let record = StatusRecord::new(id, channels);
        records.insert(id.to_string(), Arc::new(Mutex::new(record.clone())));
        *self
            .counts
            .lock()
            .await
            .entry(record.overall_status)
            .or_insert(0) += 1;
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<StatusRecord, NotificationError> {
        match self.record_lock(id).await {
            Some(lock) => Ok(lock.lock().await.clone()),
            None => Err(NotificationError::NotFound(id.to_string())),
        }
    }

    async fn update_channel(
        &self,
        id: &str,
        channel: &str,
        status: ChannelStatus,
    ) -> Result<(), NotificationError> {
        let Some(lock) = self.record_lock(id).await else {
            log::warn!("(update_channel) id={} no existe, se ignora", id);
            return Ok(());
        };

        let mut record = lock.lock().await;
        let before = record.overall_status;
        if !record.apply_channel_status(channel, status) {
            log::warn!(
                "(update_channel) Canal '{}' no pertenece a id={}, se ignora",
                channel,
                id
            );
            return Ok(());
        }

        let after = record.overall_status;
        if before != after {
            let mut counts = self.counts.lock().await;
            if let Some(n) = counts.get_mut(&before) {
                *n -= 1;
                if *n == 0 {
                    counts.remove(&before);
                }
            }
            *counts.entry(after).or_insert(0) += 1;
        }
        Ok(())
    }

    async fn count_by_status(&self) -> Result<BTreeMap<OverallStatus, u64>, NotificationError> {
        Ok(self.counts.lock().await.clone())
    }
}
