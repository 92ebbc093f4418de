//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod channel_registry;
pub mod dispatch_worker;
pub mod email_adapter;
pub mod metrics_service;
pub mod notification_service;
pub mod queue_service;
pub mod sqlite_status_store;
pub mod status_store;
pub mod webhook_service;
pub mod whatsapp_adapter;
