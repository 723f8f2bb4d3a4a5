//! Befall API client.
//!
//! This crate provides:
//!
//! - [`ApiClient`]: a `reqwest` wrapper implementing authorization, rate-limit
//!   waits and structured error decoding
//! - [`ApiContext`]: the client plus the shared application state, handed to
//!   every business operation
//! - [`ops`]: the business operations themselves

pub mod client;
pub mod context;
pub mod error;
pub mod formatters;
pub mod ops;
pub mod params;

pub use client::{ApiClient, Auth, ClientResponse, ERROR_TYPE_HEADER, FetchRequest};
pub use context::{ApiContext, SharedState, shared_state};
pub use error::ApiError;
