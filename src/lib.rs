// src/lib.rs

//! Chronicle Library
//!
//! Scrape-cache-normalize-persist pipeline for building a queryable
//! historical-events timeline from Wikipedia.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod store;
pub mod utils;
