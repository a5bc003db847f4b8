#![doc = include_str!("../../../README.md")]
//!

//! This crate re-exports the core selection and polling library together
//! with the REST server.

pub use trialwatch_core::*;
pub use trialwatch_server as server;
