//! Infrastructure configuration modules.

pub mod betting;
pub mod logging;
pub mod risk;
pub mod safeguard;
pub mod settings;

pub use settings::Config;
