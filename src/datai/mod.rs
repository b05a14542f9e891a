// src/datai/mod.rs
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;

pub use client::DataiApiClient;
pub use error::DataiError;
pub use models::ApiResponse;
