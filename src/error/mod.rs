//! Error types for the adapter layer.

mod categories;
mod types;

pub use categories::*;
pub use types::*;
