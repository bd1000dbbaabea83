// logmux - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library and the `colored` crate.
// Must NOT depend on: app, platform, or any filesystem access directly.

pub mod colour;
pub mod model;
pub mod selection;
pub mod source;
