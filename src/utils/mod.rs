//! Utility modules for the image previewer
//!
//! Small, dependency-light helpers shared by the services and web layers.

pub mod cache_key;
pub mod preview_path;
pub mod url;

// Re-export commonly used types for convenience
pub use cache_key::CacheKey;
pub use preview_path::{PreviewPath, PreviewPathParser, TargetSize};
