//! Scan record type and wire-format constants for the sensor text stream.
//!
//! One scan on the wire looks like:
//!
//! ```text
//! [DEBUG] accelerometer.cpp L.39 log_acc : ST m:  10041 c:  57 x:  228 y:  270 z:  -369 EN
//! ```
//!
//! Fields between the markers appear in free order and spacing; any of them
//! can fail to parse independently of the others.

use serde::{Deserialize, Serialize};

/// Substring identifying debug output from the accelerometer firmware module.
/// Used as a coarse validity filter alongside the markers.
pub const DEVICE_IDENTIFIER: &str = "accelerometer.cpp";

/// Literal marker preceding one scan's payload.
pub const START_MARKER: &str = "ST";

/// Literal marker terminating one scan's payload.
pub const END_MARKER: &str = "EN";

/// Default wraparound modulus of the device-side sequence counter.
pub const DEFAULT_COUNTER_MODULUS: u32 = 1 << 16;

/// One complete reading from the sensor stream.
///
/// A record is emitted whenever both structural markers for a scan were
/// found. Each field is `None` when its labeled value failed to parse;
/// partial records are emitted, not dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Milliseconds since device start; monotonically non-decreasing.
    pub timestamp_ms: Option<i64>,
    /// Device-side wraparound sequence counter.
    pub counter: Option<u32>,
    /// Raw accelerometer x-axis reading.
    pub x: Option<i32>,
    /// Raw accelerometer y-axis reading.
    pub y: Option<i32>,
    /// Raw accelerometer z-axis reading.
    pub z: Option<i32>,
}

impl ScanRecord {
    /// True when every field parsed.
    pub fn is_complete(&self) -> bool {
        self.timestamp_ms.is_some()
            && self.counter.is_some()
            && self.x.is_some()
            && self.y.is_some()
            && self.z.is_some()
    }

    /// Number of fields that failed to parse.
    pub fn missing_field_count(&self) -> u32 {
        u32::from(self.timestamp_ms.is_none())
            + u32::from(self.counter.is_none())
            + u32::from(self.x.is_none())
            + u32::from(self.y.is_none())
            + u32::from(self.z.is_none())
    }
}
