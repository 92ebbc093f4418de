//! tests/mod.rs
//! Pruebas unitarias del servicio.

mod handler_tests;
mod metrics_tests;
mod support;
mod webhook_tests;
