//! Shared value types: node identifiers, transforms and colors.

mod color;
mod types;

pub use color::{Color, ColorError};
pub use types::{NodeId, Transform};
