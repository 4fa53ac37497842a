//! Thread-shared handle to the window buffer.
//!
//! The window is the single piece of state shared between the producer
//! (parsing) side and the consumer (display/export) side. Mutation happens
//! only through [`SharedWindow::push_annotated`] on the producer side;
//! consumers take snapshots. Critical sections are short — one push plus the
//! derived-column write-back, or one copy out — so the producer never waits
//! on consumer latency.

use crate::orientation;
use crate::parser::types::ScanRecord;
use crate::window::buffer::{WindowBuffer, WindowRow};
use std::sync::{Arc, Mutex};

/// Cloneable handle to a mutex-guarded window buffer.
#[derive(Debug, Clone)]
pub struct SharedWindow {
    inner: Arc<Mutex<WindowBuffer>>,
}

impl SharedWindow {
    /// Create a shared window with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WindowBuffer::new(capacity))),
        }
    }

    /// The fixed row count of the window.
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Push a scan and fill its derived columns in one atomic update.
    ///
    /// Consumers never observe the window mid-shift or with an unannotated
    /// newest row.
    pub fn push_annotated(&self, record: &ScanRecord) {
        let mut window = self.lock();
        window.push(record);
        if let Some(row) = window.latest_mut() {
            orientation::annotate(row);
        }
    }

    /// Copy the full window out, oldest-to-newest.
    pub fn snapshot(&self) -> Vec<WindowRow> {
        self.lock().to_vec()
    }

    /// Copy of the most recently pushed row, for live readouts.
    pub fn latest(&self) -> Option<WindowRow> {
        self.lock().latest().copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WindowBuffer> {
        // A poisoned lock means a panic mid-push; the buffer itself is still
        // structurally sound (push is pop+append), so keep serving it.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
