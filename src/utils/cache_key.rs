//! Cache key derivation
//!
//! Keys are content addresses of the origin location: the SHA-256 of the
//! normalized `host[:port]/path` of the origin URL, hex encoded, with a
//! `.jpg` suffix so the key doubles as the cache file name.
//!
//! The requested width and height are not part of the key. Two previews of
//! the same origin image at different sizes share one slot and the most
//! recently produced size wins.

use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

use crate::errors::PreviewError;

/// File extension every cache entry carries
pub const CACHE_FILE_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an origin given without its scheme, e.g. `example.com/a.jpg?x=1`
    pub fn from_origin(origin: &str) -> Result<Self, PreviewError> {
        let url = origin_url(origin)?;
        Ok(Self::from_url(&url))
    }

    /// Derive the key from an already parsed origin URL
    ///
    /// The scheme, query and fragment are ignored so the http and https
    /// forms of one image map to the same entry.
    pub fn from_url(url: &Url) -> Self {
        let normalized = normalized_location(url);
        let digest = Sha256::digest(normalized.as_bytes());
        Self(format!("{}.{}", hex::encode(digest), CACHE_FILE_EXTENSION))
    }

    /// Rebuild a key from a cache file name found on disk
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(CACHE_FILE_EXTENSION)?.strip_suffix('.')?;
        if stem.is_empty() || stem.contains(['/', '\\']) || stem.starts_with('.') {
            return None;
        }
        Some(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse an origin given without scheme into an `http` URL
pub fn origin_url(origin: &str) -> Result<Url, PreviewError> {
    let url = Url::parse(&format!("http://{origin}")).map_err(|source| {
        PreviewError::InvalidOrigin {
            origin: origin.to_string(),
            source,
        }
    })?;

    if url.host_str().is_none_or(str::is_empty) {
        return Err(PreviewError::InvalidOrigin {
            origin: origin.to_string(),
            source: url::ParseError::EmptyHost,
        });
    }

    Ok(url)
}

fn normalized_location(url: &Url) -> String {
    let mut normalized = String::new();

    if let Some(host) = url.host_str() {
        normalized.push_str(host);
    }

    // Default ports are already dropped by the url crate for http and https
    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }

    normalized.push_str(url.path());
    normalized
}
