use std::str::FromStr;

use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    use_cases::account::{DeviceKind, DeviceRecord, DeviceStore},
};

fn row_to_device(row: sqlx::postgres::PgRow) -> AppResult<DeviceRecord> {
    let kind: String = row.get("kind");
    Ok(DeviceRecord {
        id: row.get("id"),
        device_id: row.get("device_id"),
        kind: DeviceKind::from_str(&kind)
            .map_err(|_| AppError::Internal(format!("Unknown device kind in store: {kind}")))?,
        name: row.get("name"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl DeviceStore for PostgresPersistence {
    async fn count_mobile(&self, subject: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM devices WHERE subject = $1 AND kind = $2",
        )
        .bind(subject)
        .bind(DeviceKind::Mobile.to_string())
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(count)
    }

    async fn count_all(&self, subject: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices WHERE subject = $1")
            .bind(subject)
            .fetch_one(self.pool())
            .await
            .map_err(AppError::from)?;

        Ok(count)
    }

    async fn register(
        &self,
        subject: &str,
        device_id: &str,
        kind: DeviceKind,
        name: &str,
    ) -> AppResult<DeviceRecord> {
        // The unique index on (subject, device_id) arbitrates duplicates;
        // no returned row means the device was already registered.
        let row = sqlx::query(
            r#"
            INSERT INTO devices (id, subject, device_id, kind, name)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (subject, device_id) DO NOTHING
            RETURNING id, device_id, kind, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(subject)
        .bind(device_id)
        .bind(kind.to_string())
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;

        match row {
            Some(row) => row_to_device(row),
            None => Err(AppError::DeviceExists),
        }
    }

    async fn list(&self, subject: &str) -> AppResult<Vec<DeviceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, device_id, kind, name, created_at
            FROM devices
            WHERE subject = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(subject)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;

        rows.into_iter().map(row_to_device).collect()
    }
}
