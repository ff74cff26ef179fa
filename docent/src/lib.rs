//! Docent answers website visitors' questions from a small structured
//! knowledge document.
//!
//! The document is segmented into chunks and embedded once at startup. Each
//! message is embedded, ranked against the chunks by cosine similarity and
//! routed by confidence: strong matches go to the language model, weak ones
//! get a canned reply that points to a human contact.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod models;
pub mod retrieval;
pub mod routing;
pub mod services;
pub mod session;
pub mod traits;

pub use error::{DocentError, Result};
