use sha2::{Digest, Sha256};

/// Lowercase, trim and collapse runs of whitespace to a single space.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cache key for a query: SHA-256 of its normalized form, hex encoded.
pub fn fingerprint(query: &str) -> String {
    sha256_hex(normalize_query(query).as_bytes())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
