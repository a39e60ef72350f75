//! Notification synchronization engine.
//!
//! Reconciles a one-time snapshot of persisted notifications with a live push
//! stream, keeps one de-duplicated store per surface, and serves bounded,
//! filtered projections of it together with aggregate counters, optimistic
//! read state and severity-driven alerts.
//!
//! ```ignore
//! let config = EngineConfig::new()?.validate()?;
//! let EngineParts { engine, handle, .. } =
//!     EngineBuilder::new(config, service, channel).build()?;
//! tokio::spawn(engine.run());
//! handle.mark_read(42u64).await?;
//! ```

pub mod adapters;
mod alert;
mod config;
mod engine;
mod errors;
mod model;
mod network;
mod projection;
mod read_state;
mod store;
pub(crate) mod utils;

pub use alert::*;
pub use config::*;
pub use engine::*;
pub use errors::*;
pub use model::*;
pub use network::*;
pub use projection::*;
pub use read_state::*;
pub use store::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
