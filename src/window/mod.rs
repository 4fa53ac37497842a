//! Sliding window of recent scans and its thread-shared handle.

pub mod buffer;
pub mod shared;

// Re-export commonly used types
pub use buffer::{WindowBuffer, WindowRow, DEFAULT_WINDOW_CAPACITY};
pub use shared::SharedWindow;
