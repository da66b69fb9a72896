mod state;
mod vehicle;

use std::{path::Path, sync::Arc};

use anyhow::Context;
use sqlx::Row;
use state::DbState;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{info, warn};

use crate::core::events::{DetectionStats, EventSink, STATS_WINDOW};
use crate::detection::normalize::clean;
use crate::models::ClassificationResult;

pub use vehicle::{
    AddOutcome, Lookup, NewVehicle, RegistryEntry, RegistryRepository, RemoveOutcome,
    VehicleStatus,
};

/// Registry key for a plate: uppercased, with everything but `A-Z0-9`
/// stripped, so it matches detected plate text. OCR corrections are not
/// applied.
pub fn registry_key(plate: &str) -> String {
    clean(plate)
}

/// SQLite-backed vehicle registry and detection history
#[derive(Debug, Clone)]
pub struct VehicleDb {
    state: Arc<DbState>,
}

impl VehicleDb {
    pub async fn new<P: AsRef<Path>>(db_file: P) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(DbState::new(db_file).await?),
        })
    }

    /// Checkpoint and close the pool. Further queries on any clone fail.
    pub async fn close(&self) -> anyhow::Result<()> {
        self.state.close().await
    }
}

fn parse_timestamp(value: &str) -> anyhow::Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .with_context(|| format!("Invalid stored timestamp {:?}", value))
}

impl RegistryRepository for VehicleDb {
    async fn lookup(&self, plate: &str) -> anyhow::Result<Lookup> {
        let mut conn = self.state.conn().await?;
        let key = registry_key(plate);
        let record = sqlx::query("SELECT status FROM vehicles WHERE plate_number = $1")
            .bind(&key)
            .fetch_optional(&mut *conn)
            .await?;
        match record {
            Some(row) => {
                let status: String = row.try_get("status")?;
                Ok(Lookup {
                    found: true,
                    active: VehicleStatus::try_from(status.as_str())? == VehicleStatus::Active,
                })
            }
            None => Ok(Lookup::default()),
        }
    }

    async fn add(&self, vehicle: &NewVehicle) -> anyhow::Result<AddOutcome> {
        let key = registry_key(&vehicle.plate_number);
        if key.is_empty() {
            anyhow::bail!("Plate number must not be empty");
        }
        let mut conn = self.state.conn().await?;
        let registered_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
        let inserted = sqlx::query(
            r#"INSERT INTO vehicles (plate_number, owner_name, vehicle_type, registered_at, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (plate_number) DO NOTHING"#,
        )
        .bind(&key)
        .bind(&vehicle.owner)
        .bind(&vehicle.vehicle_type)
        .bind(&registered_at)
        .bind(VehicleStatus::Active.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if inserted == 0 {
            warn!(plate = %key, "Vehicle already registered");
            Ok(AddOutcome::Duplicate)
        } else {
            info!(plate = %key, "Added vehicle");
            Ok(AddOutcome::Added)
        }
    }

    async fn remove(&self, plate: &str) -> anyhow::Result<RemoveOutcome> {
        let mut conn = self.state.conn().await?;
        let key = registry_key(plate);
        let deleted = sqlx::query("DELETE FROM vehicles WHERE plate_number = $1")
            .bind(&key)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        if deleted == 0 {
            warn!(plate = %key, "Vehicle not found");
            Ok(RemoveOutcome::NotFound)
        } else {
            info!(plate = %key, "Removed vehicle");
            Ok(RemoveOutcome::Removed)
        }
    }

    async fn list_all(&self) -> anyhow::Result<Vec<RegistryEntry>> {
        let mut conn = self.state.conn().await?;
        sqlx::query(
            r#"SELECT plate_number, owner_name, vehicle_type, registered_at, status
            FROM vehicles
            ORDER BY id DESC"#,
        )
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|row| -> anyhow::Result<RegistryEntry> {
            let registered_at: String = row.try_get("registered_at")?;
            let status: String = row.try_get("status")?;
            Ok(RegistryEntry {
                plate_number: row.try_get("plate_number")?,
                owner: row.try_get("owner_name")?,
                vehicle_type: row.try_get("vehicle_type")?,
                registered_at: parse_timestamp(&registered_at)?,
                status: VehicleStatus::try_from(status.as_str())?,
                _guard: (),
            })
        })
        .collect()
    }

    async fn set_status(&self, plate: &str, status: VehicleStatus) -> anyhow::Result<bool> {
        let mut conn = self.state.conn().await?;
        let key = registry_key(plate);
        let updated = sqlx::query("UPDATE vehicles SET status = $1 WHERE plate_number = $2")
            .bind(status.as_str())
            .bind(&key)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        Ok(updated > 0)
    }
}

impl EventSink for VehicleDb {
    async fn append(&self, result: &ClassificationResult) -> anyhow::Result<()> {
        let mut conn = self.state.conn().await?;
        let detected_at = result.timestamp.format(&Rfc3339)?;
        sqlx::query(
            r#"INSERT INTO detection_history (plate_number, detected_at, is_registered, confidence, camera_index)
            VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(registry_key(&result.plate_text))
        .bind(&detected_at)
        .bind(result.is_registered)
        .bind(result.confidence as f64)
        .bind(result.camera_index as i64)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<ClassificationResult>> {
        let mut conn = self.state.conn().await?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        sqlx::query(
            r#"SELECT plate_number, detected_at, is_registered, confidence, camera_index
            FROM detection_history
            ORDER BY id DESC
            LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|row| -> anyhow::Result<ClassificationResult> {
            let detected_at: String = row.try_get("detected_at")?;
            let confidence: f64 = row.try_get("confidence")?;
            let camera_index: i64 = row.try_get("camera_index")?;
            Ok(ClassificationResult {
                plate_text: row.try_get("plate_number")?,
                is_registered: row.try_get("is_registered")?,
                confidence: confidence as f32,
                timestamp: parse_timestamp(&detected_at)?,
                camera_index: u32::try_from(camera_index)?,
            })
        })
        .collect()
    }

    async fn statistics(&self) -> anyhow::Result<DetectionStats> {
        let window = self.recent(STATS_WINDOW).await?;
        Ok(DetectionStats::from_results(&window, OffsetDateTime::now_utc()))
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let mut conn = self.state.conn().await?;
        sqlx::query("DELETE FROM detection_history")
            .execute(&mut *conn)
            .await?;
        info!("Cleared detection history");
        Ok(())
    }
}
