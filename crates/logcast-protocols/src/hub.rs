//! Upstream record source.

use crate::record::Record;

/// The authoritative source of records.
///
/// The gateway forwards client-uploaded records through [`Hub::emit`] and
/// piggybacks [`Hub::buffered_records`] onto a successful login.
pub trait Hub: Send + Sync {
    /// Ingest a record into the pipeline.
    fn emit(&self, record: Record);

    /// Snapshot of the backlog, oldest first.
    fn buffered_records(&self) -> Vec<Record>;
}
