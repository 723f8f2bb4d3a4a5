//! Business operations, grouped by API area.
//!
//! Each operation is a plain `async fn(ApiContext, Request) -> Result<Response, ApiError>`
//! (or a variant without request or without response). Request types carry
//! their field table through [`befall_types::ApiRequest`].

pub mod auth;
pub mod guilds;
pub mod instance;
pub mod jobs;
pub mod platform;
pub mod users;
