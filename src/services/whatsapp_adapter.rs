//! services/whatsapp_adapter.rs
//! Adapter de WhatsApp contra un gateway HTTP (sesión + sendMessage).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::app_config::WhatsAppConfig;
use crate::services::channel_registry::ChannelAdapter;

pub struct WhatsAppAdapter {
    http_client: Client,
    base_url: String,
    session_id: String,
}

impl WhatsAppAdapter {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_id: config.session_id.clone(),
        }
    }

    /// Revisa que la sesión del gateway esté CONNECTED
    async fn ensure_connected(&self) -> Result<()> {
        let status_url = format!("{}/session/status/{}", self.base_url, self.session_id);
        let resp = self
            .http_client
            .get(&status_url)
            .send()
            .await
            .context("Fallo al hacer GET session/status")?;

        if !resp.status().is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            log::error!(
                "(ensure_connected) La respuesta NO es exitosa. body_txt='{}'",
                body_txt
            );
            return Err(anyhow!("Error consultando sesión: {}", body_txt));
        }

        let json_val = resp.json::<serde_json::Value>().await?;
        let connected = json_val
            .get("state")
            .and_then(|v| v.as_str())
            .map(|s| s == "CONNECTED")
            .unwrap_or(false);

        if !connected {
            return Err(anyhow!("Sesión WhatsApp no está CONNECTED"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppAdapter {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn supports(&self, channel: &str) -> bool {
        channel == "whatsapp"
    }

    async fn send(&self, recipient_id: &str, message: &str) -> Result<()> {
        self.ensure_connected().await?;

        let send_url = format!("{}/client/sendMessage/{}", self.base_url, self.session_id);
        let payload = serde_json::json!({
            "chatId": recipient_id,
            "contentType": "string",
            "content": message
        });

        let r = self
            .http_client
            .post(&send_url)
            .json(&payload)
            .send()
            .await
            .context("(send) Fallo al POST para texto")?;

        log::info!(
            "(send) [WHATSAPP] -> Envío texto a '{}': status={}",
            recipient_id,
            r.status()
        );
        if !r.status().is_success() {
            let e = r.text().await.unwrap_or_default();
            return Err(anyhow!("Fallo al enviar texto WhatsApp: {}", e));
        }
        Ok(())
    }
}
