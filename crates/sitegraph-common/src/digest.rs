//! Content digests for change detection
//!
//! The host graph uses a digest of each node's raw fetched payload to decide
//! whether a node changed between ingestion runs. Digests must be stable for
//! equal payloads across processes, so they are computed over the serialized
//! JSON form rather than any in-memory representation.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the hex-encoded SHA-256 digest of a byte slice.
pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compute the content digest of a JSON payload.
///
/// Serialization of a `serde_json::Value` is deterministic, so equal payloads
/// always produce equal digests.
pub fn content_digest(payload: &Value) -> String {
    digest_bytes(payload.to_string().as_bytes())
}
