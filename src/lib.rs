//! Motion Scan Agent - streaming processor for wearable motion sensor data.
//!
//! This library reassembles scan records from a chunked text stream,
//! maintains a fixed-size sliding window of the most recent scans, and
//! derives orientation channels (magnitude, pitch, roll, yaw) from each raw
//! reading.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                       Motion Scan Agent                        │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐    ┌──────────────┐    ┌──────────────┐      │
//! │  │ Reassembler │───▶│ WindowBuffer │───▶│ Orientation  │      │
//! │  │ (ST..EN)    │    │ (200 rows)   │    │ (annotate)   │      │
//! │  └─────────────┘    └──────────────┘    └──────────────┘      │
//! │         │                   │                                  │
//! │         ▼                   ▼                                  │
//! │  ┌─────────────┐    ┌──────────────┐                          │
//! │  │   ScanBus   │    │ SharedWindow │  (display / export side) │
//! │  │ subscribers │    │  snapshots   │                          │
//! │  └─────────────┘    └──────────────┘                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The producer side feeds raw chunks; chunks may contain zero, one, or many
//! scans and may begin or end mid-scan. The consumer side reads window
//! snapshots at its own cadence and never blocks on new data.
//!
//! # Example
//!
//! ```
//! use motion_scan_agent::parser::{Reassembler, ReassemblerConfig};
//! use motion_scan_agent::window::SharedWindow;
//!
//! let mut reassembler = Reassembler::new(ReassemblerConfig::default());
//! let window = SharedWindow::new(200);
//!
//! for record in reassembler.feed("ST m: 10041 c: 57 x: 228 y: 270 z: -369 EN") {
//!     window.push_annotated(&record);
//! }
//!
//! let latest = window.latest().unwrap();
//! assert_eq!(latest.x, 228.0);
//! assert!(latest.magnitude.is_finite());
//! ```

pub mod config;
pub mod orientation;
pub mod parser;
pub mod pipeline;
pub mod stats;
pub mod window;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use parser::{Reassembler, ReassemblerConfig, ScanBus, ScanRecord};
pub use pipeline::{PipelineError, ScanPipeline};
pub use stats::{SharedStreamStats, StatsSnapshot, StreamStats};
pub use window::{SharedWindow, WindowBuffer, WindowRow};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
