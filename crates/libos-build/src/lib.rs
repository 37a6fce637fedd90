//! Host-side tooling for the shim's offset tables.
//!
//! `cargo shim offsets` builds the declaration unit for a target, pulls the
//! marker records out of the compiled artifact and renders them as C, assembly
//! or Rust include files.

pub mod cargo;
pub mod config;
pub mod extract;
pub mod findup;
pub mod offsets;
pub mod render;
pub mod triple;

pub use config::{Config, OutputConfig};
pub use extract::{extract_artifact, ExtractedConstant, ExtractedTable, TargetInfo};
pub use render::{render, write_if_changed, Format, WriteOutcome};
pub use triple::TargetConfig;
