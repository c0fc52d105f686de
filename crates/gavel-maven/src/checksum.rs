//! Checksum sidecar verification for fetched payloads.
//!
//! Maven repositories publish `.sha256`/`.sha1`/`.md5` sidecars next to each
//! file. Verification tries the strongest available digest; a missing
//! sidecar is only logged, a mismatch is fatal.

use gavel_util::errors::{GavelError, GavelResult};
use gavel_util::hash;
use reqwest::Client;

use crate::repository::RepositorySource;

/// Verify `data` against whichever checksum sidecar the source publishes
/// for the file at `relpath`.
pub async fn verify(
    client: &Client,
    source: &RepositorySource,
    relpath: &str,
    data: &[u8],
) -> GavelResult<()> {
    if let Some(expected) = source.get_text(client, &format!("{relpath}.sha256")).await? {
        return check(&hash::sha256_hex(data), &extract_hash(&expected), "SHA-256", relpath);
    }
    if let Some(expected) = source.get_text(client, &format!("{relpath}.sha1")).await? {
        return check(&hash::sha1_hex(data), &extract_hash(&expected), "SHA-1", relpath);
    }
    if let Some(expected) = source.get_text(client, &format!("{relpath}.md5")).await? {
        return check(&hash::md5_hex(data), &extract_hash(&expected), "MD5", relpath);
    }

    tracing::warn!("No checksum sidecar found for {relpath}");
    Ok(())
}

/// Best-effort fetch of the SHA-1 sidecar for a payload reference.
pub async fn fetch_sha1(
    client: &Client,
    source: &RepositorySource,
    relpath: &str,
) -> GavelResult<Option<String>> {
    Ok(source
        .get_text(client, &format!("{relpath}.sha1"))
        .await?
        .map(|s| extract_hash(&s)))
}

fn check(actual: &str, expected: &str, algo: &str, relpath: &str) -> GavelResult<()> {
    if actual.eq_ignore_ascii_case(expected) {
        tracing::debug!("{algo} ok for {relpath}");
        Ok(())
    } else {
        Err(GavelError::Network {
            message: format!("{algo} mismatch for {relpath}: expected {expected}, got {actual}"),
        }
        .into())
    }
}

/// Extract the hex digest from a sidecar file.
///
/// Sidecars may contain just the digest, or `digest  filename`.
fn extract_hash(content: &str) -> String {
    content.split_whitespace().next().unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::fetch::build_client;

    #[test]
    fn extract_hash_variants() {
        assert_eq!(extract_hash("abc123\n"), "abc123");
        assert_eq!(extract_hash("abc123  lib-1.0.jar\n"), "abc123");
    }

    #[tokio::test]
    async fn verify_against_sha1_sidecar() {
        let mut files = HashMap::new();
        files.insert("a/lib/1.0/lib-1.0.jar".to_string(), "payload".to_string());
        files.insert(
            "a/lib/1.0/lib-1.0.jar.sha1".to_string(),
            hash::sha1_hex(b"payload"),
        );
        let source = RepositorySource::in_memory("test", files);
        let client = build_client().unwrap();

        verify(&client, &source, "a/lib/1.0/lib-1.0.jar", b"payload")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mismatch_is_fatal() {
        let mut files = HashMap::new();
        files.insert(
            "a/lib/1.0/lib-1.0.jar.sha1".to_string(),
            hash::sha1_hex(b"other payload"),
        );
        let source = RepositorySource::in_memory("test", files);
        let client = build_client().unwrap();

        let result = verify(&client, &source, "a/lib/1.0/lib-1.0.jar", b"payload").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_sidecar_is_tolerated() {
        let source = RepositorySource::in_memory("test", HashMap::new());
        let client = build_client().unwrap();
        verify(&client, &source, "a/lib/1.0/lib-1.0.jar", b"payload")
            .await
            .unwrap();
    }
}
