#![forbid(unsafe_code)]

//! Shared test utilities for the prefetch workspace.

pub mod fixtures;
pub mod rng;

pub use fixtures::*;
pub use rng::Xorshift64;
