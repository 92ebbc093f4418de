use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::status_model::OverallStatus;

/// Conteos derivados del status store en un instante dado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub completed: u64,
    /// Registros en PARTIAL_FAILURE; no existe un overall FAILED.
    pub failed: u64,
    pub by_status: BTreeMap<OverallStatus, u64>,
}
