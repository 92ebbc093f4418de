//! tests/support.rs
//! Dobles de prueba compartidos por los tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::error::NotificationError;
use crate::models::notification_model::NotificationRequest;
use crate::models::status_model::{ChannelStatus, OverallStatus, StatusRecord};
use crate::services::channel_registry::{ChannelAdapter, ChannelRegistry};
use crate::services::status_store::{InMemoryStatusStore, StatusStore};

pub fn request(channels: &[&str], recipients: &[&str], message: &str) -> NotificationRequest {
    NotificationRequest {
        channels: channels.iter().map(|c| c.to_string()).collect(),
        recipient_ids: recipients.iter().map(|r| r.to_string()).collect(),
        message: message.to_string(),
        metadata: serde_json::Map::new(),
    }
}

/// Adapter que guarda cada envío y puede fallar para ciertos destinatarios.
pub struct RecordingAdapter {
    channel: String,
    fail_for: Option<String>,
    always_fail: bool,
    sends: Mutex<Vec<(String, String)>>,
}

impl RecordingAdapter {
    pub fn new(channel: &str) -> Arc<Self> {
        Arc::new(Self::build(channel, None, false))
    }

    pub fn failing_for(channel: &str, recipient: &str) -> Arc<Self> {
        Arc::new(Self::build(channel, Some(recipient.to_string()), false))
    }

    pub fn always_failing(channel: &str) -> Arc<Self> {
        Arc::new(Self::build(channel, None, true))
    }

    fn build(channel: &str, fail_for: Option<String>, always_fail: bool) -> Self {
        Self {
            channel: channel.to_string(),
            fail_for,
            always_fail,
            sends: Mutex::new(Vec::new()),
        }
    }

    /// Destinatarios a los que se intentó enviar, en orden
    pub fn attempted(&self) -> Vec<String> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .map(|(recipient, _)| recipient.clone())
            .collect()
    }
}

#[async_trait]
impl ChannelAdapter for RecordingAdapter {
    fn name(&self) -> &str {
        &self.channel
    }

    fn supports(&self, channel: &str) -> bool {
        self.channel == channel
    }

    async fn send(&self, recipient_id: &str, message: &str) -> Result<()> {
        self.sends
            .lock()
            .unwrap()
            .push((recipient_id.to_string(), message.to_string()));

        if self.always_fail || self.fail_for.as_deref() == Some(recipient_id) {
            return Err(anyhow!("provider rejected {}", recipient_id));
        }
        Ok(())
    }
}

pub fn as_adapter(adapter: &Arc<RecordingAdapter>) -> Arc<dyn ChannelAdapter> {
    adapter.clone()
}

pub fn registry_with(adapters: Vec<Arc<dyn ChannelAdapter>>) -> Arc<ChannelRegistry> {
    let mut registry = ChannelRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }
    Arc::new(registry)
}

/// Store en memoria cuyas primeras N llamadas a `update_channel` fallan,
/// para simular un status store caído.
pub struct FlakyStore {
    inner: InMemoryStatusStore,
    failures_left: AtomicUsize,
    update_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: InMemoryStatusStore::new(),
            failures_left: AtomicUsize::new(failures),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// Cantidad de llamadas a `update_channel`, fallidas o no
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusStore for FlakyStore {
    async fn create(
        &self,
        id: &str,
        channels: &[String],
    ) -> Result<StatusRecord, NotificationError> {
        self.inner.create(id, channels).await
    }

    async fn get(&self, id: &str) -> Result<StatusRecord, NotificationError> {
        self.inner.get(id).await
    }

    async fn update_channel(
        &self,
        id: &str,
        channel: &str,
        status: ChannelStatus,
    ) -> Result<(), NotificationError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(NotificationError::Store("database is locked".to_string()));
        }
        self.inner.update_channel(id, channel, status).await
    }

    async fn count_by_status(&self) -> Result<BTreeMap<OverallStatus, u64>, NotificationError> {
        self.inner.count_by_status().await
    }
}
