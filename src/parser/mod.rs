//! Streaming parser for the sensor text stream.
//!
//! This module reassembles scan records from raw chunks and broadcasts them
//! to subscribers.

pub mod bus;
pub mod reassembler;
pub mod types;

// Re-export commonly used types
pub use bus::ScanBus;
pub use reassembler::{Reassembler, ReassemblerConfig};
pub use types::{
    ScanRecord, DEFAULT_COUNTER_MODULUS, DEVICE_IDENTIFIER, END_MARKER, START_MARKER,
};
