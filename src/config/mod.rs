pub mod types;
pub mod loader;

pub use types::*;
pub use loader::{load, load_with, from_overrides, merge};
