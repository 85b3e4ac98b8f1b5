#[macro_use]
extern crate log;

pub mod appearance;
pub mod auth;
pub mod browse;
pub mod chapters;
pub mod downloads;
pub mod entitlement;
pub mod error;
pub mod library;
pub mod models;
pub mod reader;
pub mod reader_settings;
pub mod sources;

/// Version of the web client, compared against the version reported by the server
pub static LIB_VERSION: &str = env!("CARGO_PKG_VERSION");
