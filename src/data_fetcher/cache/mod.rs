pub mod types;
mod core;

// Re-export cache types
pub use types::*;
// Re-export the cache itself
pub use core::*;
