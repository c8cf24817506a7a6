/// Compute the BLAKE3 hash of a byte slice, returning the hex-encoded digest.
#[must_use]
pub fn blake3_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Compute a short (8 hex chars) BLAKE3 digest, suitable for cache-busting
/// query parameters.
#[must_use]
pub fn short_hash(data: &[u8]) -> String {
    let mut hex = blake3_bytes(data);
    hex.truncate(8);
    hex
}
