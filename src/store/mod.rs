//! Authoritative in-process ledger of notifications.
//!
//! Ordering is by arrival, not by timestamp: live arrivals are prepended and
//! snapshot pages are appended, so every live entry precedes every snapshot
//! entry regardless of when the snapshot resolves.

mod notification_store;
pub use notification_store::*;
