//! Shared helpers for the integration tests.
//!
//! - `fixtures`: file contents and their digests
//! - `test_helpers`: in-process tracker and seeders on ephemeral ports

#![allow(dead_code)]

pub mod fixtures;
pub mod test_helpers;
