pub mod admin;
pub mod chat;
pub(crate) mod health;
pub mod stats;

pub use health::health_check;
