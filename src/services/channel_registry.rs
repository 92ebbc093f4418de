//! services/channel_registry.rs
//! Registro de adapters de canal. Resuelve un nombre de canal al primer
//! adapter registrado que lo soporta.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::app_config::AppConfig;
use crate::error::NotificationError;
use crate::services::email_adapter::SmtpEmailAdapter;
use crate::services::whatsapp_adapter::WhatsAppAdapter;

#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Nombre para logs
    fn name(&self) -> &str;

    fn supports(&self, channel: &str) -> bool;

    /// Entrega (o simula) el mensaje a un destinatario.
    async fn send(&self, recipient_id: &str, message: &str) -> Result<()>;
}

/// Adapter sin proveedor real: deja constancia en el log y espera
/// una latencia fija.
pub struct SimulatedAdapter {
    channel: String,
    latency: Duration,
}

impl SimulatedAdapter {
    pub fn new(channel: impl Into<String>, latency: Duration) -> Self {
        Self {
            channel: channel.into(),
            latency,
        }
    }
}

#[async_trait]
impl ChannelAdapter for SimulatedAdapter {
    fn name(&self) -> &str {
        &self.channel
    }

    fn supports(&self, channel: &str) -> bool {
        self.channel == channel
    }

    async fn send(&self, recipient_id: &str, message: &str) -> Result<()> {
        log::info!(
            "(send) [{}] Enviando a '{}': {}",
            self.channel.to_uppercase(),
            recipient_id,
            message
        );
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct ChannelRegistry {
    adapters: Vec<Arc<dyn ChannelAdapter>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registro por defecto: email, sms y push simulados.
    pub fn with_simulated_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SimulatedAdapter::new(
            "email",
            Duration::from_millis(200),
        )));
        registry.register(Arc::new(SimulatedAdapter::new(
            "sms",
            Duration::from_millis(500),
        )));
        registry.register(Arc::new(SimulatedAdapter::new(
            "push",
            Duration::from_millis(100),
        )));
        registry
    }

    /// Arma el registro según la config: los proveedores reales configurados
    /// se registran primero, así ganan sobre el simulado del mismo canal.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut registry = Self::new();

        if let Some(smtp) = &config.smtp {
            log::info!("(from_config) Email por SMTP en {}:{}", smtp.host, smtp.port);
            registry.register(Arc::new(SmtpEmailAdapter::new(smtp)?));
        }
        if let Some(wa) = &config.whatsapp {
            log::info!("(from_config) WhatsApp vía {}", wa.base_url);
            registry.register(Arc::new(WhatsAppAdapter::new(wa)));
        }

        for adapter in Self::with_simulated_defaults().adapters {
            if registry.claimed(adapter.name()) {
                continue;
            }
            registry.register(adapter);
        }
        Ok(registry)
    }

    pub fn register(&mut self, adapter: Arc<dyn ChannelAdapter>) {
        if self.claimed(adapter.name()) {
            log::warn!(
                "(register) El canal '{}' ya tiene adapter; el nuevo nunca se resolverá",
                adapter.name()
            );
        }
        self.adapters.push(adapter);
    }

    /// Primer adapter que soporta el canal (first-match-wins).
    pub fn resolve(&self, channel: &str) -> Result<Arc<dyn ChannelAdapter>, NotificationError> {
        self.adapters
            .iter()
            .find(|adapter| adapter.supports(channel))
            .cloned()
            .ok_or_else(|| NotificationError::UnsupportedChannel(channel.to_string()))
    }

    /// Nombres de los adapters registrados, en orden de registro.
    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|adapter| adapter.name()).collect()
    }

    fn claimed(&self, channel: &str) -> bool {
        self.adapters.iter().any(|adapter| adapter.supports(channel))
    }
}
