//! Business logic services
//!
//! - [`image_cache`]: disk-backed LRU cache of previews
//! - [`origin`]: fetching source images with http to https fallback
//! - [`preview`]: the request pipeline tying both together

pub mod image_cache;
pub mod origin;
pub mod preview;

pub use image_cache::{CacheStats, ImageCache, ImageCacheStore, LoadReport};
pub use origin::{
    FallbackOriginClient, HttpTransport, OriginClient, OriginRequest, OriginResponse,
    OriginTransport,
};
pub use preview::{Preview, PreviewRequest, PreviewService};
