use serde::{Deserialize, Serialize};

/// Callback de un proveedor externo.
/// Los campos son opcionales para que el servicio valide y responda
/// InvalidPayload en vez de un error de deserialización genérico.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    pub notification_id: Option<String>,
    pub channel: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
}
