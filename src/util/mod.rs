// logmux - util/mod.rs
//
// Utility modules: error types, named constants, logging setup.
// Depends only on core::model (error context carries source descriptors).

pub mod constants;
pub mod error;
pub mod logging;
