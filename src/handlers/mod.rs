//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers HTTP.
pub mod metrics_handler;
pub mod notification_handler;
pub mod webhook_handler;
