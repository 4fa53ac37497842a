//! Broadcast of parsed scan records to explicit subscribers.
//!
//! Each subscriber gets its own bounded channel. Publishing never blocks:
//! when a subscriber's channel is full the record is dropped for that
//! subscriber and counted, so a slow consumer cannot stall the stream.

use crate::parser::types::ScanRecord;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Default per-subscriber channel capacity.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 10_000;

/// Single-producer, multi-subscriber broadcast of scan records.
#[derive(Debug)]
pub struct ScanBus {
    subscribers: Vec<Sender<ScanRecord>>,
    capacity: usize,
}

impl ScanBus {
    /// Create a bus with the default per-subscriber capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Create a bus with a custom per-subscriber channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity,
        }
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&mut self) -> Receiver<ScanRecord> {
        let (sender, receiver) = bounded(self.capacity);
        self.subscribers.push(sender);
        receiver
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Publish a record to all subscribers.
    ///
    /// Returns the number of subscribers that missed the record because
    /// their channel was full. Disconnected subscribers are removed.
    pub fn publish(&mut self, record: &ScanRecord) -> u64 {
        let mut dropped = 0;
        self.subscribers.retain(|sender| {
            match sender.try_send(record.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            }
        });
        dropped
    }
}

impl Default for ScanBus {
    fn default() -> Self {
        Self::new()
    }
}
