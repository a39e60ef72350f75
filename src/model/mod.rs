//! Notification data model shared by the store, projections and the
//! external service contracts.

mod display;
mod notification;
mod stats;

pub use display::*;
pub use notification::*;
pub use stats::*;
