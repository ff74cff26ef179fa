//! v1 API Data Transfer Objects.
//!
//! These types define the wire format for the v1 REST API. They are kept
//! separate from the internal domain models in `src/models/` and handle
//! serialization, validation, and domain-model conversion.

pub mod admin;
pub mod chat;
pub mod stats;

pub use admin::*;
pub use chat::*;
pub use stats::*;
