use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Pool, Sqlite};
use tokio::sync::watch;

use crate::config::app_config::{AppConfig, StoreBackend};
use crate::logger::init_logger;
use crate::services::channel_registry::ChannelRegistry;
use crate::services::dispatch_worker::DispatchWorker;
use crate::services::metrics_service::MetricsService;
use crate::services::notification_service::NotificationService;
use crate::services::queue_service::{InMemoryQueue, NotificationQueue};
use crate::services::sqlite_status_store::SqliteStatusStore;
use crate::services::status_store::{InMemoryStatusStore, StatusStore};
use crate::services::webhook_service::WebhookService;

mod app;
mod config;
mod error;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

/// Carpeta del archivo SQLite (p.ej. ./data), si la URL apunta a un archivo.
fn database_dir(database_url: &str) -> Option<PathBuf> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

async fn setup_database(database_url: &str) -> Result<Pool<Sqlite>> {
    if let Some(dir) = database_dir(database_url) {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("No se pudo crear directorio {:?}", dir))?;
    }

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("DATABASE_URL inválida: {}", database_url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        // los escritores de update_channel esperan el lock en vez de fallar
        .busy_timeout(Duration::from_secs(10));

    log::info!("Conectando a SQLite en {}", database_url);

    let db_pool = Pool::<Sqlite>::connect_with(options)
        .await
        .context("No se pudo conectar a la base de datos SQLite.")?;

    Ok(db_pool)
}

async fn build_status_store(config: &AppConfig) -> Result<Arc<dyn StatusStore>> {
    match config.store_backend {
        StoreBackend::Sqlite => {
            let db_pool = setup_database(&config.database_url).await?;
            let store = SqliteStatusStore::new(db_pool);
            store
                .run_migrations()
                .await
                .context("Fallo en migraciones de 'notification_status'")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            log::warn!("Usando status store en memoria; los estados no sobreviven reinicios");
            Ok(Arc::new(InMemoryStatusStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env()?;

    let store = build_status_store(&config).await?;
    let queue: Arc<dyn NotificationQueue> = Arc::new(InMemoryQueue::new());
    let registry = Arc::new(ChannelRegistry::from_config(&config)?);
    log::info!("Adapters de canal registrados: {:?}", registry.names());

    let notification_service = NotificationService::new(store.clone(), queue.clone());
    let webhook_service = WebhookService::new(store.clone());
    let metrics_service = MetricsService::new(store.clone());

    // Workers de despacho (consumer group sobre la misma cola)
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut worker_handles = Vec::with_capacity(config.dispatch_workers);
    for worker_id in 0..config.dispatch_workers {
        let worker = DispatchWorker::new(worker_id, queue.clone(), store.clone(), registry.clone());
        worker_handles.push(tokio::spawn(worker.run(shutdown_rx.clone())));
    }

    log::info!("Levantando servidor en {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(notification_service.clone()))
            .app_data(web::Data::new(webhook_service.clone()))
            .app_data(web::Data::new(metrics_service.clone()))
            .configure(app::init_app)
    })
    .workers(config.http_workers)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    // El servidor terminó: avisar a los workers y esperar que cierren
    log::info!("Deteniendo {} workers...", worker_handles.len());
    let _ = shutdown_tx.send(true);
    for handle in worker_handles {
        if let Err(e) = handle.await {
            log::error!("Worker terminó con error: {:?}", e);
        }
    }

    Ok(())
}
