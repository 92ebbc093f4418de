//! services/sqlite_status_store.rs
//! Status store sobre SQLite. La actualización por canal es una transacción
//! que toma el lock de escritura de la base al empezar, por lo que los
//! escritores sobre la misma base se serializan y ninguna escritura se pierde.
//! La columna `version` cuenta los cambios de cada registro.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::error::NotificationError;
use crate::models::status_model::{ChannelStatus, OverallStatus, StatusRecord};
use crate::services::status_store::{ensure_channels, StatusStore};

const SELECT_BY_ID: &str = r#"
    SELECT id, overall_status, channel_statuses, created_at, updated_at
    FROM notification_status
    WHERE id = ?1
"#;

#[derive(Clone, Debug)]
pub struct SqliteStatusStore {
    db_pool: Pool<Sqlite>,
}

impl SqliteStatusStore {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        SqliteStatusStore { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.db_pool).await?;
        Ok(())
    }

    async fn fetch_row(&self, id: &str) -> Result<Option<SqliteRow>, NotificationError> {
        let row = sqlx::query(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(row)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, NotificationError> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| NotificationError::Store(format!("timestamp inválido '{raw}': {e}")))
}

fn row_to_record(row: &SqliteRow) -> Result<StatusRecord, NotificationError> {
    let overall_raw: String = row.try_get("overall_status")?;
    let channels_raw: String = row.try_get("channel_statuses")?;
    let created_raw: String = row.try_get("created_at")?;
    let updated_raw: String = row.try_get("updated_at")?;

    let record = StatusRecord {
        id: row.try_get("id")?,
        overall_status: overall_raw
            .parse::<OverallStatus>()
            .map_err(NotificationError::Store)?,
        channel_statuses: serde_json::from_str::<BTreeMap<String, ChannelStatus>>(&channels_raw)?,
        created_at: parse_timestamp(&created_raw)?,
        updated_at: parse_timestamp(&updated_raw)?,
    };

    Ok(record)
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn create(
        &self,
        id: &str,
        channels: &[String],
    ) -> Result<StatusRecord, NotificationError> {
        ensure_channels(id, channels)?;

        let record = StatusRecord::new(id, channels);
        let channels_json = serde_json::to_string(&record.channel_statuses)?;
        let now = record.created_at.to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO notification_status (
                id, overall_status, channel_statuses, version, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, 0, ?4, ?4)
            "#,
        )
        .bind(&record.id)
        .bind(record.overall_status.as_str())
        .bind(channels_json)
        .bind(now)
        .execute(&self.db_pool)
        .await;

        match result {
            Ok(_) => Ok(record),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(NotificationError::AlreadyExists(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: &str) -> Result<StatusRecord, NotificationError> {
        match self.fetch_row(id).await? {
            Some(row) => row_to_record(&row),
            None => Err(NotificationError::NotFound(id.to_string())),
        }
    }

    async fn update_channel(
        &self,
        id: &str,
        channel: &str,
        status: ChannelStatus,
    ) -> Result<(), NotificationError> {
        let mut tx = self.db_pool.begin().await?;

        // La primera sentencia escribe: toma el lock de escritura antes de leer,
        // así los escritores concurrentes esperan (busy_timeout) en vez de
        // pisarse. Si algo falla, el drop de `tx` hace rollback.
        let locked = sqlx::query(
            r#"
            UPDATE notification_status
            SET version = version + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if locked.rows_affected() == 0 {
            log::warn!("(update_channel) id={} no existe, se ignora", id);
            return Ok(());
        }

        let row = sqlx::query(SELECT_BY_ID)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let mut record = row_to_record(&row)?;

        if !record.apply_channel_status(channel, status) {
            log::warn!(
                "(update_channel) Canal '{}' no pertenece a id={}, se ignora",
                channel,
                id
            );
            return Ok(());
        }

        let channels_json = serde_json::to_string(&record.channel_statuses)?;
        sqlx::query(
            r#"
            UPDATE notification_status
            SET overall_status = ?1,
                channel_statuses = ?2,
                updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(record.overall_status.as_str())
        .bind(channels_json)
        .bind(record.updated_at.to_rfc3339())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::debug!(
            "(update_channel) id={} canal='{}' -> {} (agregado {})",
            id,
            channel,
            status,
            record.overall_status
        );
        Ok(())
    }

    async fn count_by_status(&self) -> Result<BTreeMap<OverallStatus, u64>, NotificationError> {
        let rows = sqlx::query(
            r#"
            SELECT overall_status, COUNT(*) as cnt
            FROM notification_status
            GROUP BY overall_status
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let status_raw: String = row.try_get("overall_status")?;
            let cnt: i64 = row.try_get("cnt")?;
            let status = status_raw
                .parse::<OverallStatus>()
                .map_err(NotificationError::Store)?;
            counts.insert(status, cnt as u64);
        }
        Ok(counts)
    }
}
