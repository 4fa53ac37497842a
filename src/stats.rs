//! Stream-health counters for a parsing session.
//!
//! This module tracks how the incoming stream is behaving — scans parsed,
//! fields that failed to parse, chunks rejected, fragments carried — without
//! retaining any sensor data itself. Counters are atomics so the producer
//! thread can record while the CLI reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Counters for the current parsing session.
#[derive(Debug)]
pub struct StreamStats {
    /// Chunks handed to the reassembler
    chunks_fed: AtomicU64,
    /// Chunks rejected by the coarse validity filter
    chunks_rejected: AtomicU64,
    /// Complete scan records emitted
    scans_parsed: AtomicU64,
    /// Labeled fields that failed to parse
    fields_missing: AtomicU64,
    /// Times an incomplete tail was carried to the next chunk
    fragments_carried: AtomicU64,
    /// Counter-continuity anomalies observed
    counter_anomalies: AtomicU64,
    /// Inter-scan timing anomalies observed
    timing_anomalies: AtomicU64,
    /// Records dropped because a subscriber lagged
    subscriber_drops: AtomicU64,
    /// Unique identifier for this session
    session_id: Uuid,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl StreamStats {
    /// Create a new stats tracker.
    pub fn new() -> Self {
        Self {
            chunks_fed: AtomicU64::new(0),
            chunks_rejected: AtomicU64::new(0),
            scans_parsed: AtomicU64::new(0),
            fields_missing: AtomicU64::new(0),
            fragments_carried: AtomicU64::new(0),
            counter_anomalies: AtomicU64::new(0),
            timing_anomalies: AtomicU64::new(0),
            subscriber_drops: AtomicU64::new(0),
            session_id: Uuid::new_v4(),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a stats tracker that persists to the given path on `save`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);
        stats
    }

    /// Unique identifier for this session.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn record_chunk_fed(&self) {
        self.chunks_fed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk_rejected(&self) {
        self.chunks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan_parsed(&self) {
        self.scans_parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fields_missing(&self, count: u64) {
        if count > 0 {
            self.fields_missing.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn record_fragment_carried(&self) {
        self.fragments_carried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_counter_anomaly(&self) {
        self.counter_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timing_anomaly(&self) {
        self.timing_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_subscriber_drops(&self, count: u64) {
        if count > 0 {
            self.subscriber_drops.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Get the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            chunks_fed: self.chunks_fed.load(Ordering::Relaxed),
            chunks_rejected: self.chunks_rejected.load(Ordering::Relaxed),
            scans_parsed: self.scans_parsed.load(Ordering::Relaxed),
            fields_missing: self.fields_missing.load(Ordering::Relaxed),
            fragments_carried: self.fragments_carried.load(Ordering::Relaxed),
            counter_anomalies: self.counter_anomalies.load(Ordering::Relaxed),
            timing_anomalies: self.timing_anomalies.load(Ordering::Relaxed),
            subscriber_drops: self.subscriber_drops.load(Ordering::Relaxed),
            session_id: self.session_id,
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Chunks fed: {}\n\
             - Chunks rejected: {}\n\
             - Scans parsed: {}\n\
             - Fields missing: {}\n\
             - Fragments carried: {}\n\
             - Counter anomalies: {}\n\
             - Timing anomalies: {}\n\
             - Subscriber drops: {}\n\
             - Session duration: {} seconds",
            snapshot.chunks_fed,
            snapshot.chunks_rejected,
            snapshot.scans_parsed,
            snapshot.fields_missing,
            snapshot.fragments_carried,
            snapshot.counter_anomalies,
            snapshot.timing_anomalies,
            snapshot.subscriber_drops,
            snapshot.session_duration_secs
        )
    }

    /// Save the current snapshot to disk, if a persist path was configured.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let snapshot = self.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of the session counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub chunks_fed: u64,
    pub chunks_rejected: u64,
    pub scans_parsed: u64,
    pub fields_missing: u64,
    pub fragments_carried: u64,
    pub counter_anomalies: u64,
    pub timing_anomalies: u64,
    pub subscriber_drops: u64,
    pub session_id: Uuid,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Shared stats handle usable from multiple threads.
pub type SharedStreamStats = Arc<StreamStats>;

/// Create a shared stats tracker.
pub fn create_shared_stats() -> SharedStreamStats {
    Arc::new(StreamStats::new())
}

/// Create a shared stats tracker with persistence.
pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedStreamStats {
    Arc::new(StreamStats::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = StreamStats::new();
        stats.record_chunk_fed();
        stats.record_chunk_fed();
        stats.record_scan_parsed();
        stats.record_fields_missing(2);
        stats.record_fields_missing(0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.chunks_fed, 2);
        assert_eq!(snapshot.scans_parsed, 1);
        assert_eq!(snapshot.fields_missing, 2);
        assert_eq!(snapshot.chunks_rejected, 0);
    }

    #[test]
    fn test_summary_contains_counts() {
        let stats = StreamStats::new();
        stats.record_scan_parsed();
        let summary = stats.summary();
        assert!(summary.contains("Scans parsed: 1"));
        assert!(summary.contains("Session duration"));
    }
}
