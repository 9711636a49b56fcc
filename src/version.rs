//! Deploy version minting.
//!
//! Each `up` invocation mints a fresh version hash so the blue and green
//! containers have distinct names even when the intent is unchanged. The
//! hash covers the intent's identity fields plus the current time.

use crate::constants::SHORT_VERSION_LEN;
use crate::intent::Intent;
use sha2::{Digest, Sha256};

/// Mints a version hash for a deploy attempt happening now.
pub fn mint(intent: &Intent) -> String {
    version_at(intent, chrono::Utc::now())
}

/// Computes the version hash for a deploy at a given instant.
///
/// Timestamps are folded in at RFC 3339 second precision, so two calls
/// separated by at least one second always produce distinct versions.
pub fn version_at(intent: &Intent, at: chrono::DateTime<chrono::Utc>) -> String {
    let data = format!(
        "{}-{}-{}-{}-{}",
        intent.project,
        intent.origin,
        intent.domain,
        intent.port,
        at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    );
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// First characters of a version hash, as embedded in container names.
pub fn short(version: &str) -> &str {
    &version[..version.len().min(SHORT_VERSION_LEN)]
}
