//! config/mod.rs
//! Configuración del servicio.

pub mod app_config;
