//! In-process record hub.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use logcast_protocols::{Hub, Record};

/// Default number of records kept for late viewers.
pub const DEFAULT_BACKLOG: usize = 1000;

const CHANNEL_CAPACITY: usize = 1024;

/// Record source with a bounded backlog.
///
/// `emit` keeps the newest `capacity` records for [`Hub::buffered_records`]
/// and publishes each record to every [`subscribe`](Self::subscribe)r.
pub struct RecordHub {
    backlog: Mutex<VecDeque<Record>>,
    capacity: usize,
    tx: broadcast::Sender<Record>,
}

impl RecordHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            backlog: Mutex::new(VecDeque::with_capacity(capacity.min(CHANNEL_CAPACITY))),
            capacity,
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Record> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.lock().len()
    }
}

impl Default for RecordHub {
    fn default() -> Self {
        Self::new(DEFAULT_BACKLOG)
    }
}

impl Hub for RecordHub {
    fn emit(&self, record: Record) {
        if self.capacity > 0 {
            let mut backlog = self.backlog.lock();
            if backlog.len() == self.capacity {
                backlog.pop_front();
            }
            backlog.push_back(record.clone());
        }
        // No subscribers is fine.
        let _ = self.tx.send(record);
    }

    fn buffered_records(&self) -> Vec<Record> {
        self.backlog.lock().iter().cloned().collect()
    }
}
