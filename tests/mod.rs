//! Test module organization
//!
//! Re-exports the shared helpers for the test files.

mod helpers;

#[allow(unused_imports)]
pub use helpers::*;
