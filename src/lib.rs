// LogTally - lib.rs
//
// Library entry point, exposing the classification core for integration
// testing and programmatic use.
//
// The CLI argument handling and file reading live in `main.rs` and are
// not part of the library surface.

pub mod core;
pub mod util;
