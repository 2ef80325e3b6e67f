//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the storage and time dependencies of the
//! betting core.

pub mod clock;
pub mod store;
