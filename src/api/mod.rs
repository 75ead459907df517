//! HTTP surface over the settlement engine.

pub mod models;
pub mod server;

pub use server::{create_router, serve, AppState};
