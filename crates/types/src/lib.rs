//! Shared type definitions for the Befall console.
//!
//! This crate holds the data model every other crate agrees on: declarative
//! request shapes, coerced argument values, navigation locations, sessions,
//! the persisted application state and the API wire models.

pub mod location;
pub mod models;
pub mod session;
pub mod shape;
pub mod state;
pub mod value;

pub use location::{Location, LocationParseError};
pub use session::{SessionError, SessionStore, UserSession};
pub use shape::{ApiRequest, ApiResponse, FieldKind, FieldSpec, Placement, RequestShape, ResponseShape};
pub use state::{AppState, FetchOptions, ROOT_LOCATION, StateError, UserPrefs};
pub use value::{TypedArgs, TypedValue};
