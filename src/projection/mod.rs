//! Per-surface views derived from the shared [`crate::NotificationStore`].
//!
//! Projections hold no entries of their own. After every store mutation the
//! registry recomputes each view and publishes it on a `watch` channel, so
//! surfaces only ever observe complete, consistent sequences.

mod filter;
mod registry;
mod stats_tracker;
pub use filter::*;
pub use registry::*;
pub use stats_tracker::*;
