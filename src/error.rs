//! error.rs
//! Errores del núcleo de notificaciones.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// Request de ingesta inválido, se rechaza antes de tocar el estado.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Callback de webhook inválido, se rechaza antes de tocar el estado.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("unsupported channel: {0}")]
    UnsupportedChannel(String),

    /// Falla del adapter al enviar a un destinatario.
    #[error("delivery failed on channel '{channel}' for recipient '{recipient}': {reason}")]
    Delivery {
        channel: String,
        recipient: String,
        reason: String,
    },

    #[error("notification not found: {0}")]
    NotFound(String),

    #[error("notification already exists: {0}")]
    AlreadyExists(String),

    /// No se pudo leer o persistir en el status store. Nunca se absorbe.
    #[error("status store error: {0}")]
    Store(String),

    #[error("queue error: {0}")]
    Queue(String),
}

impl NotificationError {
    /// Fallas que solo afectan a un canal y el worker convierte en FAILED.
    pub fn is_channel_failure(&self) -> bool {
        matches!(
            self,
            NotificationError::UnsupportedChannel(_) | NotificationError::Delivery { .. }
        )
    }
}

impl From<sqlx::Error> for NotificationError {
    fn from(e: sqlx::Error) -> Self {
        NotificationError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(e: serde_json::Error) -> Self {
        NotificationError::Store(format!("corrupt channel statuses: {e}"))
    }
}
