//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod recorder;

#[allow(unused_imports)]
pub use fixtures::{adopter, animal, report, shelter, volunteer, TestEnvironment};
#[allow(unused_imports)]
pub use recorder::{RecordingSink, ScriptedMedia};
