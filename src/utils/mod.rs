// src/utils/mod.rs

//! Shared utilities.

pub mod http;

pub use http::create_async_client;
