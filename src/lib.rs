// src/lib.rs
pub mod api;
pub mod config;
pub mod engine;
pub mod query;
pub mod registry;
pub mod schema;
pub mod store;

pub use config::*;
pub use engine::*;
