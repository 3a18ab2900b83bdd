//! Run configuration
//!
//! Settings come from an optional JSON file and are then overridden by
//! command-line flags.

pub mod security;
pub mod settings;

pub use security::{SecurityConfig, SecurityMaterial, SecurityMode};
pub use settings::Settings;
