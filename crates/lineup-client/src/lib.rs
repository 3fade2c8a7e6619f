// Library root: re-exports all modules so integration tests and the binary
// can access the crate's public API.

pub mod config;
pub mod gateway;
pub mod input;
pub mod model;
pub mod params;
pub mod protocol;
pub mod recommendations;
pub mod render;
pub mod roster;
pub mod session;
