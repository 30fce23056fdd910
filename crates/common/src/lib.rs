//! Helpers shared across the plugcheck crates.

pub mod error;

pub use error::FromMessage;
