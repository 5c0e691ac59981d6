//! Indirection-string parsing.
//!
//! Secrets can be named indirectly through a URI of the form
//! `shush://<key>`, typically held in an environment variable. The key is
//! taken verbatim from the host component; the port and query are reserved
//! for future use (versioned references) and currently ignored.

use url::Url;

use crate::error::{Error, Result};

/// The only scheme accepted in secret references.
pub const SCHEME: &str = "shush";

/// Extract the secret key from a `shush://<key>` reference.
///
/// Any malformed URI, any other scheme, or a missing key all fail with
/// [`Error::InvalidReference`].
pub fn parse_reference(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw).map_err(|e| Error::InvalidReference {
        uri: raw.to_string(),
        reason: e.to_string(),
    })?;

    if parsed.scheme() != SCHEME {
        return Err(Error::InvalidReference {
            uri: raw.to_string(),
            reason: format!("expected `{SCHEME}` scheme, got `{}`", parsed.scheme()),
        });
    }

    match parsed.host_str() {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(Error::InvalidReference {
            uri: raw.to_string(),
            reason: "reference names no key".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_key_from_host() {
        let key = parse_reference("shush://dev.my-secret").unwrap();
        assert_eq!(key, "dev.my-secret");
    }

    #[test]
    fn rejects_other_schemes() {
        let err = parse_reference("http://dev.my-secret").unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn rejects_non_uris() {
        let err = parse_reference("not-a-uri").unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn rejects_empty_string() {
        assert!(parse_reference("").is_err());
    }

    #[test]
    fn rejects_missing_key() {
        assert!(parse_reference("shush://").is_err());
    }
}
