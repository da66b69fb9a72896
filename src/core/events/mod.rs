//! Append-only stores of classification outcomes.
//!
//! Two file formats are kept for external tooling: a CSV stream with the
//! columns `Timestamp, Number_Plate, Status, Confidence, Camera_Index`, and a
//! JSON array holding only the most recent entries. The database detection
//! history implements the same trait (see `core::db`).

mod csv_log;
mod json_log;

use std::collections::HashSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::{ClassificationResult, DetectionStatus};

pub use csv_log::{CSV_HEADER, CsvEventLog};
pub use json_log::{DEFAULT_JSON_CAPACITY, JsonEventLog};

/// Number of most recent records statistics are computed over
pub const STATS_WINDOW: usize = 1000;

pub trait EventSink {
    fn append(&self, result: &ClassificationResult) -> impl Future<Output = anyhow::Result<()>>;
    /// Most recent first
    fn recent(&self, limit: usize)
    -> impl Future<Output = anyhow::Result<Vec<ClassificationResult>>>;
    fn statistics(&self) -> impl Future<Output = anyhow::Result<DetectionStats>>;
    fn clear(&self) -> impl Future<Output = anyhow::Result<()>>;
}

/// Aggregate view over stored detections
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionStats {
    pub total: usize,
    pub registered_count: usize,
    pub unregistered_count: usize,
    pub average_confidence: f32,
    pub unique_plates: usize,
    /// Detections divided by the hours since the oldest one, at least one hour
    pub detections_per_hour: f64,
}

impl DetectionStats {
    pub fn from_results(results: &[ClassificationResult], now: OffsetDateTime) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let total = results.len();
        let registered_count = results.iter().filter(|r| r.is_registered).count();
        let confidence_sum: f64 = results.iter().map(|r| r.confidence as f64).sum();
        let unique_plates = results
            .iter()
            .map(|r| r.plate_text.as_str())
            .collect::<HashSet<_>>()
            .len();

        let oldest = results
            .iter()
            .map(|r| r.timestamp)
            .min()
            .unwrap_or(now);
        let hours = (now - oldest).as_seconds_f64() / 3600.0;

        Self {
            total,
            registered_count,
            unregistered_count: total - registered_count,
            average_confidence: (confidence_sum / total as f64) as f32,
            unique_plates,
            detections_per_hour: total as f64 / hours.max(1.0),
        }
    }
}

/// One persisted detection, as written to the structured log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub plate_number: String,
    pub status: DetectionStatus,
    pub confidence: f32,
    pub camera_index: u32,
}

impl From<&ClassificationResult> for DetectionRecord {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            timestamp: result.timestamp,
            plate_number: result.plate_text.clone(),
            status: result.status(),
            confidence: result.confidence,
            camera_index: result.camera_index,
        }
    }
}

impl From<DetectionRecord> for ClassificationResult {
    fn from(record: DetectionRecord) -> Self {
        Self {
            plate_text: record.plate_number,
            is_registered: record.status.is_registered(),
            confidence: record.confidence,
            timestamp: record.timestamp,
            camera_index: record.camera_index,
        }
    }
}

/// Take the last `limit` items, newest first
pub(crate) fn newest_first<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    let start = items.len().saturating_sub(limit);
    let mut tail = items.split_off(start);
    tail.reverse();
    tail
}

/// Writes to both sinks; reads come from the first.
#[derive(Debug, Clone)]
pub struct TeeSink<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A, B> TeeSink<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: EventSink, B: EventSink> EventSink for TeeSink<A, B> {
    async fn append(&self, result: &ClassificationResult) -> anyhow::Result<()> {
        let first = self.primary.append(result).await;
        let second = self.secondary.append(result).await;
        first.and(second)
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<ClassificationResult>> {
        self.primary.recent(limit).await
    }

    async fn statistics(&self) -> anyhow::Result<DetectionStats> {
        self.primary.statistics().await
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let first = self.primary.clear().await;
        let second = self.secondary.clear().await;
        first.and(second)
    }
}
