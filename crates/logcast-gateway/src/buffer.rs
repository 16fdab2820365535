//! Pending records awaiting broadcast.

use parking_lot::Mutex;
use tracing::trace;

use logcast_protocols::{Envelope, Record};

use crate::transport::TransportHost;
use crate::AUTH_ROOM;

/// Append-only queue of records, drained by [`flush`](Self::flush).
///
/// The buffer is unbounded. Backpressure belongs upstream.
#[derive(Debug, Default)]
pub struct BroadcastBuffer {
    pending: Mutex<Vec<Record>>,
}

impl BroadcastBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&self, record: Record) {
        self.pending.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Copy of the pending records, oldest first.
    pub fn snapshot(&self) -> Vec<Record> {
        self.pending.lock().clone()
    }

    /// Send everything pending as one `RECORDS` frame to the authenticated
    /// room and clear the buffer. An empty buffer still sends an empty frame.
    ///
    /// The lock is held across the broadcast so that concurrent flushes
    /// reach every connection queue in buffer order. Returns the number of
    /// records flushed.
    pub fn flush(&self, transport: &TransportHost) -> usize {
        let mut pending = self.pending.lock();
        let records = std::mem::take(&mut *pending);
        let count = records.len();
        let reached = transport.broadcast_to_room(AUTH_ROOM, &Envelope::records(records));
        trace!("Flushed {} records to {} viewers", count, reached);
        count
    }
}
