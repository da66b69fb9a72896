use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{DetectionRecord, DetectionStats, EventSink, newest_first};
use crate::models::ClassificationResult;

pub const DEFAULT_JSON_CAPACITY: usize = 1000;

/// Structured detection log: a JSON array holding at most `capacity` records,
/// oldest dropped first.
#[derive(Debug)]
pub struct JsonEventLog {
    path: PathBuf,
    capacity: usize,
    lock: Mutex<()>,
}

impl JsonEventLog {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::with_capacity(path, DEFAULT_JSON_CAPACITY)
    }

    pub fn with_capacity<P: AsRef<Path>>(path: P, capacity: usize) -> anyhow::Result<Self> {
        if capacity == 0 {
            anyhow::bail!("JSON log capacity must be at least 1");
        }
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            capacity,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored records, oldest first. A missing or unreadable file reads as empty.
    pub fn records(&self) -> anyhow::Result<Vec<DetectionRecord>> {
        let _guard = self.guard();
        self.load()
    }

    fn load(&self) -> anyhow::Result<Vec<DetectionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open JSON log {:?}", self.path))?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "JSON log unreadable, starting fresh");
                Ok(Vec::new())
            }
        }
    }

    fn persist(&self, records: &[DetectionRecord]) -> anyhow::Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to write JSON log {:?}", self.path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for JsonEventLog {
    async fn append(&self, result: &ClassificationResult) -> anyhow::Result<()> {
        let _guard = self.guard();
        let mut records = self.load()?;
        records.push(DetectionRecord::from(result));
        if records.len() > self.capacity {
            let overflow = records.len() - self.capacity;
            records.drain(..overflow);
        }
        self.persist(&records)
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<ClassificationResult>> {
        let _guard = self.guard();
        let results = self.load()?.into_iter().map(Into::into).collect();
        Ok(newest_first(results, limit))
    }

    async fn statistics(&self) -> anyhow::Result<DetectionStats> {
        let _guard = self.guard();
        let results: Vec<ClassificationResult> =
            self.load()?.into_iter().map(Into::into).collect();
        Ok(DetectionStats::from_results(&results, OffsetDateTime::now_utc()))
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let _guard = self.guard();
        self.persist(&[])?;
        info!(path = %self.path.display(), "Cleared JSON log");
        Ok(())
    }
}
