//! config/app_config.rs
//! Configuración global del servicio, leída del entorno (.env incluido).

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("STATUS_STORE desconocido: '{}'", other)),
        }
    }
}

/// Credenciales SMTP para el adapter de email real
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub subject: String,
}

/// Gateway HTTP de WhatsApp
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub base_url: String,
    pub session_id: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub http_workers: usize,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub dispatch_workers: usize,
    pub smtp: Option<SmtpConfig>,
    pub whatsapp: Option<WhatsAppConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 5022,
            http_workers: 1,
            store_backend: StoreBackend::Sqlite,
            database_url: "sqlite:data/notifications.db".to_string(),
            dispatch_workers: 2,
            smtp: None,
            whatsapp: None,
        }
    }
}

impl AppConfig {
    /// Lee la configuración de variables de entorno; lo que no esté
    /// definido toma el valor de `Default`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente arbitraria (útil en tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let host = lookup("SERVER_HOST").unwrap_or(defaults.host);
        let port = parse_or("SERVER_PORT", &lookup, defaults.port)?;
        let http_workers = parse_or("HTTP_WORKERS", &lookup, defaults.http_workers)?;
        let store_backend = parse_or("STATUS_STORE", &lookup, defaults.store_backend)?;
        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);
        let dispatch_workers = parse_or("DISPATCH_WORKERS", &lookup, defaults.dispatch_workers)?;

        if dispatch_workers == 0 {
            return Err(anyhow!("DISPATCH_WORKERS debe ser mayor a 0"));
        }

        // SMTP solo si hay host; el resto de campos pasa a ser obligatorio
        let smtp = match lookup("SMTP_HOST") {
            Some(smtp_host) => Some(SmtpConfig {
                host: smtp_host,
                port: parse_or("SMTP_PORT", &lookup, 587u16)?,
                user: lookup("SMTP_USER").ok_or_else(|| anyhow!("Falta SMTP_USER"))?,
                pass: lookup("SMTP_PASS").ok_or_else(|| anyhow!("Falta SMTP_PASS"))?,
                from: lookup("SMTP_FROM").ok_or_else(|| anyhow!("Falta SMTP_FROM"))?,
                subject: lookup("SMTP_SUBJECT").unwrap_or_else(|| "Notification".to_string()),
            }),
            None => None,
        };

        let whatsapp = match lookup("WHATSAPP_API_URL") {
            Some(base_url) => Some(WhatsAppConfig {
                base_url,
                session_id: lookup("WHATSAPP_API_SESSION_ID")
                    .ok_or_else(|| anyhow!("No se definió WHATSAPP_API_SESSION_ID"))?,
            }),
            None => None,
        };

        Ok(AppConfig {
            host,
            port,
            http_workers,
            store_backend,
            database_url,
            dispatch_workers,
            smtp,
            whatsapp,
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Valor inválido para {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
