//! Isotet - tetrahedral isosurface extraction
//!
//! Library half of the `isotet` binary: layered configuration and the
//! extraction system that ties fields, extractor and output together.

pub mod config;
pub mod systems;
