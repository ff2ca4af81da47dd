//! Shared utilities and types used across the snapshot, trading and REST layers.

pub mod scaling;
pub mod types;

// Re-export commonly used items
pub use scaling::{from_native, to_native, ScalingError};
pub use types::*;
