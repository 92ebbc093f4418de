use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estado de un canal dentro de una notificación.
/// PENDING -> PROCESSING -> COMPLETED | FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Pending => "PENDING",
            ChannelStatus::Processing => "PROCESSING",
            ChannelStatus::Completed => "COMPLETED",
            ChannelStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ChannelStatus::Pending),
            "PROCESSING" => Ok(ChannelStatus::Processing),
            "COMPLETED" => Ok(ChannelStatus::Completed),
            "FAILED" => Ok(ChannelStatus::Failed),
            other => Err(format!("estado de canal desconocido: '{other}'")),
        }
    }
}

/// Estado agregado de la notificación. Nunca se asigna directamente,
/// siempre se deriva de los estados por canal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Enqueued,
    Processing,
    Completed,
    PartialFailure,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Enqueued => "ENQUEUED",
            OverallStatus::Processing => "PROCESSING",
            OverallStatus::Completed => "COMPLETED",
            OverallStatus::PartialFailure => "PARTIAL_FAILURE",
        }
    }

    /// Regla de agregación:
    /// - todos COMPLETED => COMPLETED
    /// - alguno FAILED => PARTIAL_FAILURE (aunque fallen todos)
    /// - alguno distinto de PENDING => PROCESSING
    /// - si no, ENQUEUED
    ///
    /// Sin canales da COMPLETED; los stores rechazan registros sin canales.
    pub fn aggregate<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = &'a ChannelStatus>,
    {
        let statuses: Vec<&ChannelStatus> = statuses.into_iter().collect();

        if statuses.iter().all(|s| **s == ChannelStatus::Completed) {
            OverallStatus::Completed
        } else if statuses.iter().any(|s| **s == ChannelStatus::Failed) {
            OverallStatus::PartialFailure
        } else if statuses.iter().any(|s| **s != ChannelStatus::Pending) {
            OverallStatus::Processing
        } else {
            OverallStatus::Enqueued
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ENQUEUED" => Ok(OverallStatus::Enqueued),
            "PROCESSING" => Ok(OverallStatus::Processing),
            "COMPLETED" => Ok(OverallStatus::Completed),
            "PARTIAL_FAILURE" => Ok(OverallStatus::PartialFailure),
            other => Err(format!("estado agregado desconocido: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: String,
    pub overall_status: OverallStatus,
    pub channel_statuses: BTreeMap<String, ChannelStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    /// Registro inicial: todos los canales en PENDING, overall ENQUEUED.
    /// Canales repetidos quedan como una sola llave.
    pub fn new(id: impl Into<String>, channels: &[String]) -> Self {
        let now = Utc::now();
        let channel_statuses: BTreeMap<String, ChannelStatus> = channels
            .iter()
            .map(|ch| (ch.clone(), ChannelStatus::Pending))
            .collect();

        StatusRecord {
            id: id.into(),
            overall_status: OverallStatus::aggregate(channel_statuses.values()),
            channel_statuses,
            created_at: now,
            updated_at: now,
        }
    }

    /// Aplica un nuevo estado a un canal existente y recalcula el agregado.
    /// Devuelve false (sin tocar nada) si el canal no es parte del registro.
    pub fn apply_channel_status(&mut self, channel: &str, status: ChannelStatus) -> bool {
        match self.channel_statuses.get_mut(channel) {
            Some(current) => {
                *current = status;
                self.overall_status = OverallStatus::aggregate(self.channel_statuses.values());
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}
