// LogTally - core/mod.rs
//
// Core classification logic.
// Dependencies: regex, serde_yaml, rayon (compute only).
// Must NOT depend on: filesystem paths, process state, or the CLI layer.

pub mod analyzer;
pub mod export;
pub mod result;
pub mod rule;
pub mod rules;
