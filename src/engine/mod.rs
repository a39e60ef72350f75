//! The engine loop tying store, projections, read state and alerts together.
//!
//! One task owns every mutable piece of state. Network completions, UI
//! commands and live channel events are funnelled into it and handled one at
//! a time, so arrival order is the only ordering that matters.

mod builder;
mod event;
mod handle;
mod notification_engine;
pub use builder::*;
pub use event::*;
pub use handle::*;
pub use notification_engine::*;
