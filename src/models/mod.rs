//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod metrics_model;
pub mod notification_model;
pub mod response_model;
pub mod status_model;
pub mod webhook_model;
