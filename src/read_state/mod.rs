//! Optimistic read/unread mutation with server confirmation.
//!
//! Local marks are applied immediately and never rolled back: a lost
//! confirmation must not resurrect an alert the user already dismissed.
//! Counters are re-derived from the store whenever a confirmation resolves.

mod coordinator;
pub use coordinator::*;
