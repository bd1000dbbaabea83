// logmux - app/mod.rs
//
// Application layer: tailer threads, the aggregator loop, run bootstrap.
// Dependencies: core layer, util.
// Must NOT depend on: platform specifics (providers are injected).

pub mod aggregate;
pub mod mux;
pub mod tail;
