//! Zonal controller sensor simulator.

/// HTTP routes for the fuel level and headlight services.
pub mod api;
pub mod cli;
pub mod config;
pub mod devices;
/// Guarded access, response framing, streaming and the OBD/lighting services.
pub mod service;
