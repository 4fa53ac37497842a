//! Streaming reassembly of scan records from raw text chunks.
//!
//! The sensor stream arrives in arbitrary chunks: a chunk can hold zero, one,
//! or many scans, and can begin or end in the middle of one. The
//! [`Reassembler`] stitches chunks back together using the `ST`/`EN` markers,
//! carries any incomplete tail across calls, and extracts the five labeled
//! fields independently so one malformed field never voids a whole record.

use crate::parser::bus::ScanBus;
use crate::parser::types::{
    ScanRecord, DEFAULT_COUNTER_MODULUS, DEVICE_IDENTIFIER, END_MARKER, START_MARKER,
};
use crate::stats::SharedStreamStats;
use crossbeam_channel::Receiver;
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

/// Tuning knobs for the reassembler's diagnostic checks.
#[derive(Debug, Clone)]
pub struct ReassemblerConfig {
    /// Expected milliseconds between consecutive scans.
    pub expected_interval_ms: i64,
    /// Slack allowed on top of the expected interval before warning.
    pub interval_tolerance_ms: i64,
    /// Wraparound modulus of the device sequence counter.
    pub counter_modulus: u32,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self {
            expected_interval_ms: 100,
            interval_tolerance_ms: 100,
            counter_modulus: DEFAULT_COUNTER_MODULUS,
        }
    }
}

/// Compiled patterns for the five labeled fields.
///
/// Each field is "label, optional whitespace, signed integer" and is matched
/// independently of the others, anywhere in the payload.
#[derive(Debug)]
struct FieldPatterns {
    millis: Regex,
    counter: Regex,
    x: Regex,
    y: Regex,
    z: Regex,
}

impl FieldPatterns {
    fn compile() -> Self {
        // Hard-coded patterns; compilation cannot fail.
        Self {
            millis: Regex::new(r"m:\s*(-?\d+)").expect("field regex"),
            counter: Regex::new(r"c:\s*(-?\d+)").expect("field regex"),
            x: Regex::new(r"x:\s*(-?\d+)").expect("field regex"),
            y: Regex::new(r"y:\s*(-?\d+)").expect("field regex"),
            z: Regex::new(r"z:\s*(-?\d+)").expect("field regex"),
        }
    }

    /// Extract one signed integer field, or None if the pattern does not match.
    fn extract<T: std::str::FromStr>(pattern: &Regex, payload: &str, label: &str) -> Option<T> {
        let parsed = pattern
            .captures(payload)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<T>().ok());
        if parsed.is_none() {
            warn!(field = label, payload, "field failed to parse, left missing");
        }
        parsed
    }
}

/// Stateful reassembler for the sensor text stream.
///
/// Owns the carried fragment of any incomplete scan and the [`ScanBus`] that
/// broadcasts emitted records to subscribers.
pub struct Reassembler {
    config: ReassemblerConfig,
    patterns: FieldPatterns,
    bus: ScanBus,
    stats: SharedStreamStats,
    /// Unconsumed tail of an incomplete scan, prepended to the next chunk.
    fragment: String,
    last_counter: Option<u32>,
    last_timestamp_ms: Option<i64>,
}

impl Reassembler {
    /// Create a reassembler with its own stats tracker.
    pub fn new(config: ReassemblerConfig) -> Self {
        Self::with_stats(config, Arc::new(crate::stats::StreamStats::new()))
    }

    /// Create a reassembler recording into a shared stats tracker.
    pub fn with_stats(config: ReassemblerConfig, stats: SharedStreamStats) -> Self {
        Self {
            config,
            patterns: FieldPatterns::compile(),
            bus: ScanBus::new(),
            stats,
            fragment: String::new(),
            last_counter: None,
            last_timestamp_ms: None,
        }
    }

    /// Register a subscriber for emitted scan records.
    pub fn subscribe(&mut self) -> Receiver<ScanRecord> {
        self.bus.subscribe()
    }

    /// The stats tracker this reassembler records into.
    pub fn stats(&self) -> &SharedStreamStats {
        &self.stats
    }

    /// Consume one raw chunk, returning every complete scan record it closed.
    ///
    /// Records are returned in stream order and also published to all
    /// subscribers. A chunk with no recognizable sensor content is dropped
    /// without touching the carried fragment. A start marker with no matching
    /// end marker leaves the tail carried for the next call.
    pub fn feed(&mut self, chunk: &str) -> Vec<ScanRecord> {
        self.stats.record_chunk_fed();

        if !is_sensor_data(chunk) {
            self.stats.record_chunk_rejected();
            return Vec::new();
        }

        // Prepend any fragment left over from the previous chunk.
        let mut working = std::mem::take(&mut self.fragment);
        working.push_str(chunk);

        let mut records = Vec::new();
        while let Some((payload_start, payload_end, rest_start)) = find_scan_bounds(&working) {
            let record = self.parse_payload(&working[payload_start..payload_end]);
            self.check_continuity(&record);

            let dropped = self.bus.publish(&record);
            self.stats.record_subscriber_drops(dropped);
            self.stats.record_scan_parsed();
            self.stats
                .record_fields_missing(u64::from(record.missing_field_count()));
            records.push(record);

            working.drain(..rest_start);
        }

        // Whatever is left belongs to a scan still in flight.
        if !working.is_empty() {
            self.stats.record_fragment_carried();
            self.fragment = working;
        }

        records
    }

    /// Extract the five labeled fields from one scan payload.
    ///
    /// Fields are matched independently; a failed match leaves that field
    /// `None` and the record is still emitted.
    fn parse_payload(&self, payload: &str) -> ScanRecord {
        ScanRecord {
            timestamp_ms: FieldPatterns::extract(&self.patterns.millis, payload, "millis"),
            counter: FieldPatterns::extract(&self.patterns.counter, payload, "counter"),
            x: FieldPatterns::extract(&self.patterns.x, payload, "x"),
            y: FieldPatterns::extract(&self.patterns.y, payload, "y"),
            z: FieldPatterns::extract(&self.patterns.z, payload, "z"),
        }
    }

    /// Diagnostic continuity checks. Logged only; never alters output.
    fn check_continuity(&mut self, record: &ScanRecord) {
        if let Some(counter) = record.counter {
            if let Some(last) = self.last_counter {
                // Wraparound-aware delta: a rollover from modulus-1 to 0 is
                // still a step of 1 under the modulus.
                let modulus = i64::from(self.config.counter_modulus);
                let delta =
                    (i64::from(counter) - i64::from(last)).rem_euclid(modulus);
                if delta != 1 {
                    self.stats.record_counter_anomaly();
                    warn!(last, counter, delta, "counter discontinuity");
                }
            }
            self.last_counter = Some(counter);
        }

        if let Some(timestamp_ms) = record.timestamp_ms {
            if let Some(last) = self.last_timestamp_ms {
                let delta = timestamp_ms - last;
                let limit = self.config.expected_interval_ms + self.config.interval_tolerance_ms;
                if delta > limit {
                    self.stats.record_timing_anomaly();
                    warn!(delta, limit, "inter-scan interval above expected");
                }
            }
            self.last_timestamp_ms = Some(timestamp_ms);
        }
    }
}

/// Coarse validity filter: does this chunk contain anything that looks like
/// sensor data at all?
fn is_sensor_data(chunk: &str) -> bool {
    chunk.contains(DEVICE_IDENTIFIER)
        || chunk.contains(START_MARKER)
        || chunk.contains(END_MARKER)
}

/// Locate the next complete scan in `data`.
///
/// Returns `(payload_start, payload_end, rest_start)` byte offsets: the
/// payload between the markers (exclusive) and where the remainder of the
/// buffer begins after the end marker. `None` when no complete scan is left.
fn find_scan_bounds(data: &str) -> Option<(usize, usize, usize)> {
    let payload_start = data.find(START_MARKER)? + START_MARKER.len();
    let payload_end = payload_start + data[payload_start..].find(END_MARKER)?;
    let rest_start = payload_end + END_MARKER.len();
    Some((payload_start, payload_end, rest_start))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_SCAN: &str =
        "[DEBUG] accelerometer.cpp L.39 log_acc : ST m:  10041 c:  57 x:  228 y:  270 z:  -369 EN ";

    #[test]
    fn test_round_trip_single_scan() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());
        let records = reassembler.feed(FULL_SCAN);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.timestamp_ms, Some(10041));
        assert_eq!(record.counter, Some(57));
        assert_eq!(record.x, Some(228));
        assert_eq!(record.y, Some(270));
        assert_eq!(record.z, Some(-369));
    }

    #[test]
    fn test_split_scan_reassembly() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());

        let first = reassembler.feed("ST m: 10041 c: 57 x:");
        assert!(first.is_empty());

        let second = reassembler.feed(" 228 y: 270 z: -369 EN");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].timestamp_ms, Some(10041));
        assert_eq!(second[0].x, Some(228));
        assert_eq!(second[0].z, Some(-369));
    }

    #[test]
    fn test_multi_scan_chunk() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());
        let chunk = "ST m: 100 c: 1 x: 1 y: 2 z: 3 EN junk ST m: 200 c: 2 x: 4 y: 5 z: 6 EN";
        let records = reassembler.feed(chunk);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp_ms, Some(100));
        assert_eq!(records[1].timestamp_ms, Some(200));
        assert_eq!(records[1].z, Some(6));
    }

    #[test]
    fn test_missing_field_still_emitted() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());
        let records = reassembler.feed("ST m: 10041 c: 57 x: 228 z: -369 EN");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.y, None);
        assert_eq!(record.timestamp_ms, Some(10041));
        assert_eq!(record.counter, Some(57));
        assert_eq!(record.x, Some(228));
        assert_eq!(record.z, Some(-369));
        assert_eq!(record.missing_field_count(), 1);
    }

    #[test]
    fn test_invalid_chunk_rejected_and_fragment_kept() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());

        // Leave a fragment in flight.
        assert!(reassembler.feed("ST m: 10041 c: 57").is_empty());
        let fragment_before = reassembler.fragment.clone();
        assert!(!fragment_before.is_empty());

        // Noise with no identifier or markers must not disturb it.
        let records = reassembler.feed("wifi driver: beacon loss");
        assert!(records.is_empty());
        assert_eq!(reassembler.fragment, fragment_before);

        // The fragment still completes afterwards.
        let records = reassembler.feed(" x: 1 y: 2 z: 3 EN");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].counter, Some(57));
    }

    #[test]
    fn test_fragment_cleared_after_completion() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());
        reassembler.feed("ST m: 1 c: 1 x: 1 y: 1");
        reassembler.feed(" z: 1 EN");
        assert!(reassembler.fragment.is_empty());
    }

    #[test]
    fn test_negative_values_parse() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());
        let records = reassembler.feed("ST m: 5 c: 9 x: -512 y: -1 z: -369 EN");
        assert_eq!(records[0].x, Some(-512));
        assert_eq!(records[0].y, Some(-1));
    }

    #[test]
    fn test_counter_rollover_is_not_an_anomaly() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());
        reassembler.feed("ST m: 100 c: 65535 x: 0 y: 0 z: 0 EN");
        reassembler.feed("ST m: 200 c: 0 x: 0 y: 0 z: 0 EN");
        assert_eq!(reassembler.stats.snapshot().counter_anomalies, 0);

        // A genuine skip is flagged.
        reassembler.feed("ST m: 300 c: 5 x: 0 y: 0 z: 0 EN");
        assert_eq!(reassembler.stats.snapshot().counter_anomalies, 1);
    }

    #[test]
    fn test_timing_anomaly_recorded() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());
        reassembler.feed("ST m: 100 c: 1 x: 0 y: 0 z: 0 EN");
        reassembler.feed("ST m: 205 c: 2 x: 0 y: 0 z: 0 EN");
        assert_eq!(reassembler.stats.snapshot().timing_anomalies, 0);

        reassembler.feed("ST m: 1000 c: 3 x: 0 y: 0 z: 0 EN");
        assert_eq!(reassembler.stats.snapshot().timing_anomalies, 1);
    }

    #[test]
    fn test_subscriber_receives_emitted_records() {
        let mut reassembler = Reassembler::new(ReassemblerConfig::default());
        let receiver = reassembler.subscribe();

        reassembler.feed(FULL_SCAN);

        let record = receiver.try_recv().unwrap();
        assert_eq!(record.counter, Some(57));
    }
}
