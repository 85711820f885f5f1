//! Application systems
//!
//! The binary drives these; tests exercise them without a process.

mod extraction;

pub use extraction::{ExtractionSystem, SystemError};
