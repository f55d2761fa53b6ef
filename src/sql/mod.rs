//! SQL boundary: statement text helpers, bind values and the pooled execution layer.

mod builder;
mod executor;
pub mod params;
pub use builder::*;
pub use executor::{Database, Row};
pub use params::*;
