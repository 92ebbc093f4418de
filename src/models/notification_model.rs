use serde::{Deserialize, Serialize};

use crate::error::NotificationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// ["email", "sms", "push"] etc.
    pub channels: Vec<String>,

    /// Destinatarios, en el orden en que se envían
    pub recipient_ids: Vec<String>,

    pub message: String,

    /// Datos libres del llamador
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl NotificationRequest {
    pub fn validate(&self) -> Result<(), NotificationError> {
        if self.channels.is_empty() {
            return Err(NotificationError::InvalidRequest(
                "channels must not be empty".to_string(),
            ));
        }
        if self.channels.iter().any(|ch| ch.trim().is_empty()) {
            return Err(NotificationError::InvalidRequest(
                "channel names must not be blank".to_string(),
            ));
        }
        if self.recipient_ids.is_empty() {
            return Err(NotificationError::InvalidRequest(
                "recipient_ids must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Canales en orden de request, sin repetidos (un canal lógico por nombre).
    pub fn distinct_channels(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.channels.len());
        for ch in &self.channels {
            if !seen.contains(&ch.as_str()) {
                seen.push(ch.as_str());
            }
        }
        seen
    }
}

/// Mensaje en la cola: llave = id de notificación, valor = request original.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    pub notification_id: String,
    pub request: NotificationRequest,
}

impl QueueMessage {
    pub fn new(notification_id: impl Into<String>, request: NotificationRequest) -> Self {
        QueueMessage {
            notification_id: notification_id.into(),
            request,
        }
    }

    pub fn key(&self) -> &str {
        &self.notification_id
    }

    /// Serializa solo el request; la llave viaja aparte.
    pub fn encode_value(&self) -> Result<String, NotificationError> {
        serde_json::to_string(&self.request)
            .map_err(|e| NotificationError::Queue(format!("no se pudo serializar: {e}")))
    }

    pub fn decode(key: &str, value: &str) -> Result<Self, NotificationError> {
        let request = serde_json::from_str::<NotificationRequest>(value)
            .map_err(|e| NotificationError::Queue(format!("payload inválido para {key}: {e}")))?;
        Ok(QueueMessage::new(key, request))
    }
}

/// Respuesta de POST /api/notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResponse {
    pub notification_id: String,
    pub status: String,
}
