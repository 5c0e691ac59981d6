//! Field population: hydrate a record's string fields from secrets.
//!
//! The original design used runtime reflection over struct tags; here the
//! mapping is an explicit, compile-time-checked list of field descriptors
//! supplied by the record itself. Only string slots exist by construction,
//! and the target is always a mutable reference, so the unsupported-type and
//! immutable-target failure modes of a reflective approach cannot arise.

use tracing::debug;

use crate::error::{Error, Result};

use super::Session;

/// Descriptor for one populatable field: its name (for error reporting), its
/// secret-key mapping, and the string slot to write into.
pub struct SecretField<'a> {
    name: &'static str,
    key: Option<String>,
    slot: &'a mut String,
}

impl<'a> SecretField<'a> {
    /// A field mapped to the given secret key.
    pub fn mapped(name: &'static str, key: impl Into<String>, slot: &'a mut String) -> Self {
        Self {
            name,
            key: Some(key.into()),
            slot,
        }
    }

    /// A field declared without a mapping. Populating it is always an error;
    /// this exists so mechanically generated descriptor lists can surface the
    /// omission as [`Error::MissingMapping`] instead of silently skipping it.
    pub fn unmapped(name: &'static str, slot: &'a mut String) -> Self {
        Self {
            name,
            key: None,
            slot,
        }
    }
}

/// A record whose string fields can be hydrated from secrets.
///
/// Implementations return one [`SecretField`] per field, in declaration
/// order; [`Session::populate`] processes them in exactly that order.
pub trait SecretBound {
    fn secret_fields(&mut self) -> Vec<SecretField<'_>>;
}

impl Session {
    /// Populate every declared field of `target` by reading one secret per
    /// field, in declaration order.
    ///
    /// An unmapped or empty mapping aborts immediately; fields populated
    /// before the failing one keep their values (no rollback).
    pub async fn populate<T: SecretBound>(&self, target: &mut T) -> Result<()> {
        for field in target.secret_fields() {
            let key = match field.key.as_deref() {
                None => return Err(Error::MissingMapping { field: field.name }),
                Some("") => return Err(Error::EmptyMapping { field: field.name }),
                Some(key) => key,
            };

            let (value, version) = self.get(key).await?;
            debug!(field = field.name, key, version, "populated field");
            *field.slot = value;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UpsertPolicy;
    use crate::storage::{SecretRecord, StorageProvider};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MapStorage(HashMap<String, SecretRecord>);

    impl MapStorage {
        fn new(pairs: &[(&str, &str, i64)]) -> Self {
            Self(
                pairs
                    .iter()
                    .map(|(k, v, ver)| {
                        (
                            k.to_string(),
                            SecretRecord {
                                value: v.to_string(),
                                version: *ver,
                            },
                        )
                    })
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl StorageProvider for MapStorage {
        async fn get(&self, keys: &[String]) -> Result<Vec<SecretRecord>> {
            Ok(keys.iter().filter_map(|k| self.0.get(k).cloned()).collect())
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        async fn latest_version(&self, key: &str) -> Result<i64> {
            Ok(self.0.get(key).map(|r| r.version).unwrap_or(0))
        }
    }

    #[derive(Default)]
    struct AppSecrets {
        api_token: String,
        db_password: String,
    }

    impl SecretBound for AppSecrets {
        fn secret_fields(&mut self) -> Vec<SecretField<'_>> {
            vec![
                SecretField::mapped("api_token", "a", &mut self.api_token),
                SecretField::mapped("db_password", "b", &mut self.db_password),
            ]
        }
    }

    #[derive(Default)]
    struct PartiallyMapped {
        first: String,
        second: String,
    }

    impl SecretBound for PartiallyMapped {
        fn secret_fields(&mut self) -> Vec<SecretField<'_>> {
            vec![
                SecretField::mapped("first", "a", &mut self.first),
                SecretField::mapped("second", "", &mut self.second),
            ]
        }
    }

    #[derive(Default)]
    struct Undeclared {
        only: String,
    }

    impl SecretBound for Undeclared {
        fn secret_fields(&mut self) -> Vec<SecretField<'_>> {
            vec![SecretField::unmapped("only", &mut self.only)]
        }
    }

    fn session_over(pairs: &[(&str, &str, i64)]) -> Session {
        Session::new(
            Arc::new(MapStorage::new(pairs)),
            None,
            UpsertPolicy::ReplaceNewer,
        )
    }

    #[tokio::test]
    async fn populates_all_mapped_fields_in_order() {
        let session = session_over(&[("a", "x", 1), ("b", "y", 2)]);
        let mut target = AppSecrets::default();

        session.populate(&mut target).await.unwrap();
        assert_eq!(target.api_token, "x");
        assert_eq!(target.db_password, "y");
    }

    #[tokio::test]
    async fn empty_mapping_aborts_but_keeps_earlier_fields() {
        let session = session_over(&[("a", "x", 1)]);
        let mut target = PartiallyMapped::default();

        let err = session.populate(&mut target).await.unwrap_err();
        assert!(matches!(err, Error::EmptyMapping { field: "second" }));
        // The first field was already populated and stays populated.
        assert_eq!(target.first, "x");
        assert_eq!(target.second, "");
    }

    #[tokio::test]
    async fn missing_mapping_is_a_hard_error() {
        let session = session_over(&[]);
        let mut target = Undeclared::default();

        let err = session.populate(&mut target).await.unwrap_err();
        assert!(matches!(err, Error::MissingMapping { field: "only" }));
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        // "b" resolves to zero records, which get() reports as an invariant
        // violation; populate must forward it untouched.
        let session = session_over(&[("a", "x", 1)]);
        let mut target = AppSecrets::default();

        let err = session.populate(&mut target).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResultCount { count: 0 }));
        assert_eq!(target.api_token, "x");
    }
}
