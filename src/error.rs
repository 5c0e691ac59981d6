//! Error taxonomy for secret access and reconciliation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by sessions, providers, and the reference parser.
///
/// Provider-internal failures (network, permissions, I/O) travel through the
/// transparent [`Error::Provider`] variant unchanged; the core never retries
/// and never rewraps them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Storage answered a single-key lookup with something other than one
    /// result. This is an invariant violation in the provider, not a miss.
    #[error("expected exactly one result from storage, got {count}")]
    UnexpectedResultCount { count: usize },

    /// `sync` was called on a storage provider without prefix enumeration.
    #[error("storage provider does not support prefix enumeration")]
    SyncUnsupported,

    /// `sync` was called on a session with no cache to hydrate.
    #[error("no cache provider configured")]
    NoCacheConfigured,

    /// An indirection string was malformed or used the wrong scheme.
    #[error("invalid secret reference `{uri}`: {reason}")]
    InvalidReference { uri: String, reason: String },

    /// A field descriptor declared no secret key mapping.
    #[error("field `{field}` has no secret key mapping")]
    MissingMapping { field: &'static str },

    /// A field descriptor declared an empty secret key mapping.
    #[error("field `{field}` has an empty secret key mapping")]
    EmptyMapping { field: &'static str },

    /// Failure inside a storage or cache provider, propagated verbatim.
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}
