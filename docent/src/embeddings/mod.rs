mod api;
mod provider;

#[cfg(test)]
mod tests;

pub use api::{default_base_url, ApiConfig, EmbeddingApiClient};
pub use provider::EmbeddingProvider;
