//! HTTP client for the prediction backend.

pub mod client;
pub mod models;

pub use client::*;
pub use models::*;
