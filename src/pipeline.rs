//! Producer-side pipeline: raw chunks in, annotated window rows out.
//!
//! One thread owns the reassembler and drives it from a bounded channel of
//! raw text chunks. Every emitted record is pushed into the shared window
//! (with its derived columns filled atomically) and broadcast to
//! subscribers. The consumer side reads the window at its own cadence and is
//! never waited on.

use crate::config::Config;
use crate::parser::reassembler::{Reassembler, ReassemblerConfig};
use crate::parser::types::ScanRecord;
use crate::stats::SharedStreamStats;
use crate::window::shared::SharedWindow;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Capacity of the raw chunk queue feeding the producer thread.
const CHUNK_QUEUE_CAPACITY: usize = 10_000;

/// Errors from pipeline lifecycle operations.
#[derive(Debug)]
pub enum PipelineError {
    AlreadyRunning,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::AlreadyRunning => write!(f, "Pipeline is already running"),
        }
    }
}

impl std::error::Error for PipelineError {}

/// The scan-processing pipeline.
///
/// Subscribers must register before [`start`](Self::start); the reassembler
/// (and its broadcast bus) moves into the producer thread when it spawns.
pub struct ScanPipeline {
    chunk_sender: Sender<String>,
    chunk_receiver: Receiver<String>,
    reassembler: Option<Reassembler>,
    window: SharedWindow,
    stats: SharedStreamStats,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScanPipeline {
    /// Build a pipeline from the agent configuration.
    pub fn new(config: &Config, stats: SharedStreamStats) -> Self {
        let (chunk_sender, chunk_receiver) = bounded(CHUNK_QUEUE_CAPACITY);
        let reassembler_config = ReassemblerConfig {
            expected_interval_ms: config.expected_interval_ms,
            interval_tolerance_ms: config.interval_tolerance_ms,
            counter_modulus: config.counter_modulus,
        };

        Self {
            chunk_sender,
            chunk_receiver,
            reassembler: Some(Reassembler::with_stats(reassembler_config, stats.clone())),
            window: SharedWindow::new(config.window_capacity),
            stats,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Sender for raw stream chunks. Clone freely; the transport layer feeds
    /// chunks here and blocks only when the queue is full.
    pub fn chunk_sender(&self) -> Sender<String> {
        self.chunk_sender.clone()
    }

    /// Handle to the shared window, for consumer-side snapshots.
    pub fn window(&self) -> SharedWindow {
        self.window.clone()
    }

    /// The stats tracker this pipeline records into.
    pub fn stats(&self) -> &SharedStreamStats {
        &self.stats
    }

    /// Register a subscriber for emitted scan records.
    ///
    /// Must be called before [`start`](Self::start).
    pub fn subscribe(&mut self) -> Option<Receiver<ScanRecord>> {
        self.reassembler.as_mut().map(|r| r.subscribe())
    }

    /// Spawn the producer thread.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        let Some(mut reassembler) = self.reassembler.take() else {
            return Err(PipelineError::AlreadyRunning);
        };

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let receiver = self.chunk_receiver.clone();
        let window = self.window.clone();

        let handle = std::thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                match receiver.recv_timeout(Duration::from_millis(100)) {
                    Ok(chunk) => {
                        for record in reassembler.feed(&chunk) {
                            window.push_annotated(&record);
                        }
                    }
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                        // No new data; not an error, keep waiting.
                    }
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                        debug!("chunk source disconnected, stopping producer");
                        break;
                    }
                }
            }
            // Any in-flight fragment is discarded with the reassembler.
        });

        self.handle = Some(handle);
        Ok(())
    }

    /// Stop the producer thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Check if the producer thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for ScanPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
