//! Validation and base-relative resolution of caller-supplied URIs.
use crate::error::ExploreError;
use oxiri::Iri;
use std::fmt;

/// An absolute, syntactically valid URI. Only constructed by [UriResolver].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedUri(String);

impl ResolvedUri {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves request URIs against the configured base, if any.
#[derive(Clone, Debug)]
pub struct UriResolver {
    base: Option<Iri<String>>,
}

impl UriResolver {
    /// An invalid base URI is a deployment mistake and fails at startup.
    pub fn new(base: Option<&str>) -> Result<Self, String> {
        let base = match base {
            None => None,
            Some(b) => Some(Iri::parse(b.to_owned()).map_err(|e| format!("invalid base_uri '{b}': {e}"))?),
        };
        Ok(UriResolver { base })
    }

    /// Resolve a raw request value. Empty input means "nothing to explore"
    /// and yields `None`. With a base configured, relative references are
    /// resolved against it and absolute ones pass through, per RFC 3986;
    /// without one the input must itself be absolute.
    ///
    /// The error carries a fixed message naming only the parameter. The raw
    /// value is attacker-controlled and must not be echoed anywhere it
    /// could reach a browser.
    pub fn resolve(&self, raw: &str) -> Result<Option<ResolvedUri>, ExploreError> {
        if raw.is_empty() {
            return Ok(None);
        }
        let absolute = match &self.base {
            Some(base) => base.resolve(raw).map_err(|_| ExploreError::InvalidUri("uri"))?,
            None => Iri::parse(raw.to_owned()).map_err(|_| ExploreError::InvalidUri("uri"))?,
        };
        Ok(Some(ResolvedUri(absolute.into_inner())))
    }
}
