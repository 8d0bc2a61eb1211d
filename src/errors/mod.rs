//! Centralized error handling for the image previewer
//!
//! # Error Categories
//!
//! - **Cache Errors**: disk-backed cache store failures (create, list, write, evict, clear)
//! - **Fetch Errors**: origin connectivity and response body failures
//! - **Preview Errors**: request parsing, decoding, encoding and storage failures,
//!   each mapped onto the HTTP status the client sees
//!
//! # Usage
//!
//! ```rust
//! use image_previewer::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("max_dimension must be at least 1"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for cache store Results
pub type CacheResult<T> = Result<T, CacheError>;

/// Convenience type alias for origin fetch Results
pub type FetchResult<T> = Result<T, FetchError>;

/// Convenience type alias for preview pipeline Results
pub type PreviewResult<T> = Result<T, PreviewError>;
