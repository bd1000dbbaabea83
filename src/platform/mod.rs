// logmux - platform/mod.rs
//
// Platform layer: config file handling and the filesystem-backed source
// provider.
// Dependencies: core, util, directories/walkdir/glob crates.
// Must NOT depend on: app.

pub mod config;
pub mod dir_source;
pub mod follow;
