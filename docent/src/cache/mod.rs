mod fingerprint;
mod response_cache;

pub use fingerprint::{fingerprint, normalize_query, sha256_hex};
pub use response_cache::{CachedResponse, ResponseCache};
