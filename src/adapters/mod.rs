//! In-process implementations of the external service contracts, used by the
//! demo binary and integration tests.

pub mod memory;
