//! Snapshot persistence for the source model.

pub mod error;
pub mod snapshot;

pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{MAGIC, SnapshotLimits, VERSION, read_snapshot, write_snapshot};
