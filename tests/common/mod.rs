//! Common test utilities and helper modules
//!
//! Shared by the integration test crates: a scripted in-memory connection,
//! mock byte streams for the codec, and helpers for recording handler
//! invocations.
#![allow(dead_code)]

pub mod mock_connection;
pub mod mock_streams;
pub mod test_helpers;
