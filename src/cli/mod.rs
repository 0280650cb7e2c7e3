// src/cli/mod.rs
//
// Command-line interface for facies probability estimation

pub mod args;
pub mod output;

pub use args::Args;
pub use output::{format_json, format_summary};
