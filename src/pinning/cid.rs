//! Content identifier checks and gateway URL helpers.

use std::sync::LazyLock;

use regex::Regex;

use crate::pinning::types::{InvalidReason, PinError};

/// Public gateway used when the caller does not name one.
pub const DEFAULT_GATEWAY: &str = "https://gateway.pinata.cloud";

const MAX_CONTENT_ID_LEN: usize = 128;

/// CIDv0: base58btc multihash, always 46 characters starting with `Qm`.
static CID_V0: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Qm[1-9A-HJ-NP-Za-km-z]{44}$").expect("valid CIDv0 pattern"));

/// CIDv1 in the default lowercase base32 multibase.
static CID_V1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^b[a-z2-7]{58,127}$").expect("valid CIDv1 pattern"));

static IPFS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/ipfs/([a-zA-Z0-9]+)").expect("valid gateway path pattern"));

/// Full format check for identifiers supplied by callers.
pub fn is_valid_content_id(hash: &str) -> bool {
    CID_V0.is_match(hash) || CID_V1.is_match(hash)
}

/// Reject anything that is not a well-formed identifier before it is
/// interpolated into a request path.
pub fn validate_hash(hash: &str) -> Result<(), PinError> {
    if is_valid_content_id(hash) {
        Ok(())
    } else {
        Err(PinError::invalid(
            InvalidReason::InvalidHash,
            format!("'{}' is not a valid content identifier", truncate(hash, 64)),
        ))
    }
}

/// Character-class check for identifiers returned by the provider.
pub fn has_content_id_charset(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_CONTENT_ID_LEN
        && value.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// `<gateway>/ipfs/<hash>`.
pub fn gateway_url(hash: &str, gateway: Option<&str>) -> String {
    let gateway = gateway.unwrap_or(DEFAULT_GATEWAY).trim_end_matches('/');
    format!("{}/ipfs/{}", gateway, hash)
}

/// Pull the identifier out of a gateway URL.
pub fn extract_hash(url: &str) -> Option<&str> {
    IPFS_PATH
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn truncate(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V0: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
    const V1: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

    #[test]
    fn test_accepts_both_cid_versions() {
        assert!(is_valid_content_id(V0));
        assert!(is_valid_content_id(V1));
        assert!(validate_hash(V0).is_ok());
    }

    #[test]
    fn test_rejects_traversal_and_short_values() {
        for bad in ["../../etc/passwd", "tooshort", "", "QmABC123", &format!("{}/x", V0)] {
            let err = validate_hash(bad).unwrap_err();
            assert_eq!(err.invalid_reason(), Some(InvalidReason::InvalidHash), "{bad}");
        }
        // base58 excludes 0, O, I and l
        assert!(!is_valid_content_id("Qm0wAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"));
    }

    #[test]
    fn test_charset_check_is_looser_than_format() {
        assert!(has_content_id_charset("QmABC123"));
        assert!(!has_content_id_charset(""));
        assert!(!has_content_id_charset("Qm/../x"));
        assert!(!has_content_id_charset(&"a".repeat(129)));
    }

    #[test]
    fn test_gateway_url_round_trip() {
        let url = gateway_url(V0, None);
        assert_eq!(url, format!("https://gateway.pinata.cloud/ipfs/{}", V0));
        assert_eq!(extract_hash(&url), Some(V0));
        assert_eq!(
            gateway_url("QmX", Some("https://ipfs.io/")),
            "https://ipfs.io/ipfs/QmX"
        );
        assert_eq!(extract_hash("https://example.com/nothing"), None);
    }
}
