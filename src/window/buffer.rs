//! Fixed-capacity sliding window of the most recent scans.
//!
//! The window always holds exactly `capacity` rows. Before any data arrives
//! every row is unfilled (NaN in every column), so consumers that plot the
//! window can start at full size. Each push drops the oldest row and appends
//! the new one at the newest end.
//!
//! Order convention: rows are stored oldest-to-newest. Index `len - 1` (the
//! back) is the most recently pushed row, and iteration is chronological.

use crate::parser::types::ScanRecord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of rows retained in the window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 200;

/// One row of the window: the raw scan channels plus derived columns.
///
/// All columns are `f64`; NaN marks a value that is unfilled or whose raw
/// field failed to parse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowRow {
    pub timestamp_ms: f64,
    pub counter: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub magnitude: f64,
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl WindowRow {
    /// A row with every column unfilled.
    pub fn unfilled() -> Self {
        Self {
            timestamp_ms: f64::NAN,
            counter: f64::NAN,
            x: f64::NAN,
            y: f64::NAN,
            z: f64::NAN,
            magnitude: f64::NAN,
            pitch: f64::NAN,
            roll: f64::NAN,
            yaw: f64::NAN,
        }
    }

    /// Build a row from a scan record. Missing raw fields become NaN and the
    /// derived columns start unfilled.
    pub fn from_record(record: &ScanRecord) -> Self {
        Self {
            timestamp_ms: record.timestamp_ms.map_or(f64::NAN, |v| v as f64),
            counter: record.counter.map_or(f64::NAN, f64::from),
            x: record.x.map_or(f64::NAN, f64::from),
            y: record.y.map_or(f64::NAN, f64::from),
            z: record.z.map_or(f64::NAN, f64::from),
            magnitude: f64::NAN,
            pitch: f64::NAN,
            roll: f64::NAN,
            yaw: f64::NAN,
        }
    }

    /// True when all three raw axis readings are present.
    pub fn has_axes(&self) -> bool {
        !self.x.is_nan() && !self.y.is_nan() && !self.z.is_nan()
    }

    /// True when no raw channel has been filled in.
    pub fn is_unfilled(&self) -> bool {
        self.timestamp_ms.is_nan()
            && self.counter.is_nan()
            && self.x.is_nan()
            && self.y.is_nan()
            && self.z.is_nan()
    }
}

/// Bounded, ordered container of the most recent scan rows.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    rows: VecDeque<WindowRow>,
    capacity: usize,
}

impl WindowBuffer {
    /// Create a window pre-filled with `capacity` unfilled rows.
    pub fn new(capacity: usize) -> Self {
        let mut rows = VecDeque::with_capacity(capacity);
        rows.resize(capacity, WindowRow::unfilled());
        Self { rows, capacity }
    }

    /// The fixed row count of this window.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current row count; always equals `capacity`.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Push a scan, evicting the oldest row.
    ///
    /// The new row's derived columns start unfilled; use
    /// [`latest_mut`](Self::latest_mut) to fill them in.
    pub fn push(&mut self, record: &ScanRecord) {
        self.rows.pop_front();
        self.rows.push_back(WindowRow::from_record(record));
    }

    /// Iterate rows oldest-to-newest.
    pub fn rows(&self) -> impl Iterator<Item = &WindowRow> {
        self.rows.iter()
    }

    /// Copy the full window out, in chronological order.
    pub fn to_vec(&self) -> Vec<WindowRow> {
        self.rows.iter().copied().collect()
    }

    /// The most recently pushed row.
    pub fn latest(&self) -> Option<&WindowRow> {
        self.rows.back()
    }

    /// Mutable access to the most recently pushed row, used to write the
    /// derived columns back after a push.
    pub fn latest_mut(&mut self) -> Option<&mut WindowRow> {
        self.rows.back_mut()
    }
}
