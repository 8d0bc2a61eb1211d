//! Error type definitions for the image previewer
//!
//! Each layer owns its error enum; `AppError` ties them together for the
//! web layer. Every variant carries the key, path or URL it failed on so the
//! message is useful in a log line without extra context.

use axum::http::StatusCode;
use image::ImageError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache store errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Preview pipeline errors
    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Disk-backed cache errors
///
/// Any of these aborts the operation that raised it with the in-memory index
/// still matching the files on disk.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to list cache directory {path}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("Failed to encode cache entry {key}: {source}")]
    Encode { key: String, source: ImageError },

    #[error("Failed to write cache entry {key} to {path}: {source}")]
    Write {
        key: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to evict cache entry {key} at {path}: {source}")]
    Evict {
        key: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to remove {failed} cache entries, first failure at {path}: {source}")]
    Clear {
        failed: usize,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Cache task failed: {message}")]
    Task { message: String },
}

/// Origin fetch errors
///
/// A non-2xx origin response is not an error; it is handed back to the
/// caller to be mirrored.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid origin URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Origin unreachable: {url} - http error: {http_error}, https error: {https_error}")]
    Unreachable {
        url: String,
        http_error: String,
        https_error: String,
    },

    #[error("Failed to read origin response body from {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Failure of a single origin attempt
#[derive(Error, Debug)]
pub enum TransportError {
    /// No HTTP response was received; another scheme may still work
    #[error("{0}")]
    Unreachable(String),

    /// A response arrived but could not be read
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Preview pipeline errors
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("Invalid preview path '{path}': expected /{{width}}/{{height}}/{{origin}}")]
    InvalidPath { path: String },

    #[error("Invalid {field} '{value}': {message}")]
    InvalidDimension {
        field: &'static str,
        value: String,
        message: String,
    },

    #[error("Invalid origin URL '{origin}': {source}")]
    InvalidOrigin {
        origin: String,
        source: url::ParseError,
    },

    #[error("Origin fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Unsupported image from {url}: {source}")]
    UnsupportedMedia { url: String, source: ImageError },

    #[error("Failed to decode image from {url}: {source}")]
    Decode { url: String, source: ImageError },

    #[error("Failed to encode preview: {0}")]
    Encode(#[source] ImageError),

    #[error("Failed to store preview: {0}")]
    Cache(#[from] CacheError),

    #[error("Image processing task failed: {message}")]
    Task { message: String },
}

impl PreviewError {
    /// HTTP status reported to the client for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPath { .. }
            | Self::InvalidDimension { .. }
            | Self::InvalidOrigin { .. } => StatusCode::BAD_REQUEST,
            Self::Decode { .. } => StatusCode::BAD_REQUEST,
            Self::UnsupportedMedia { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Fetch(_) | Self::Encode(_) | Self::Cache(_) | Self::Task { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
