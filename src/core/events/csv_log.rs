use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{DetectionStats, EventSink, STATS_WINDOW, newest_first};
use crate::models::{ClassificationResult, DetectionStatus};

pub const CSV_HEADER: [&str; 5] = [
    "Timestamp",
    "Number_Plate",
    "Status",
    "Confidence",
    "Camera_Index",
];

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Timestamp", with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    #[serde(rename = "Number_Plate")]
    number_plate: String,
    #[serde(rename = "Status")]
    status: DetectionStatus,
    #[serde(rename = "Confidence")]
    confidence: f32,
    #[serde(rename = "Camera_Index")]
    camera_index: u32,
}

impl From<&ClassificationResult> for CsvRow {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            timestamp: result.timestamp,
            number_plate: result.plate_text.clone(),
            status: result.status(),
            confidence: result.confidence,
            camera_index: result.camera_index,
        }
    }
}

impl From<CsvRow> for ClassificationResult {
    fn from(row: CsvRow) -> Self {
        Self {
            plate_text: row.number_plate,
            is_registered: row.status.is_registered(),
            confidence: row.confidence,
            timestamp: row.timestamp,
            camera_index: row.camera_index,
        }
    }
}

/// Tabular detection log, one row per classification
#[derive(Debug)]
pub struct CsvEventLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvEventLog {
    /// Open the log, writing the header if the file does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let log = Self {
            path,
            lock: Mutex::new(()),
        };
        if !log.path.exists() {
            log.write_header()?;
            info!(path = %log.path.display(), "Initialized CSV log file");
        }
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_header(&self) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to create CSV log {:?}", self.path))?;
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        Ok(())
    }

    fn read_all(&self) -> anyhow::Result<Vec<ClassificationResult>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open CSV log {:?}", self.path))?;
        let mut results = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            match row {
                Ok(row) => results.push(row.into()),
                Err(e) => warn!(line = line + 2, error = %e, "Skipping malformed CSV log row"),
            }
        }
        Ok(results)
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for CsvEventLog {
    async fn append(&self, result: &ClassificationResult) -> anyhow::Result<()> {
        let _guard = self.guard();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open CSV log {:?} for append", self.path))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(CsvRow::from(result))?;
        writer.flush()?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<ClassificationResult>> {
        let _guard = self.guard();
        Ok(newest_first(self.read_all()?, limit))
    }

    async fn statistics(&self) -> anyhow::Result<DetectionStats> {
        let _guard = self.guard();
        let all = self.read_all()?;
        let start = all.len().saturating_sub(STATS_WINDOW);
        Ok(DetectionStats::from_results(
            &all[start..],
            OffsetDateTime::now_utc(),
        ))
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let _guard = self.guard();
        self.write_header()?;
        info!(path = %self.path.display(), "Cleared CSV log");
        Ok(())
    }
}
