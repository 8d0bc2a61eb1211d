//! Preview request pipeline
//!
//! Parse the request path, derive the cache key, then either serve the
//! cached image or fetch, decode, crop, scale and store the origin image.

use bytes::Bytes;
use image::{DynamicImage, ImageError};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

use crate::errors::{AppError, AppResult, CacheResult, PreviewError, PreviewResult};
use crate::imaging;
use crate::services::image_cache::{CacheStats, ImageCache};
use crate::services::origin::{OriginClient, OriginRequest};
use crate::utils::cache_key::{CacheKey, origin_url};
use crate::utils::url::redact_credentials;
use crate::utils::{PreviewPathParser, TargetSize};

/// An inbound preview request, as received from the client
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    /// Path and query, e.g. `/300/200/example.com/a.jpg?v=1`
    pub path_and_query: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl PreviewRequest {
    pub fn get<S: Into<String>>(path_and_query: S) -> Self {
        Self {
            path_and_query: path_and_query.into(),
            method: Method::GET,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Result of a preview request
#[derive(Debug, Clone)]
pub enum Preview {
    /// Served from the cache without contacting the origin
    Cached { jpeg: Bytes },
    /// Freshly fetched and transformed
    Fetched { jpeg: Bytes, origin_url: Url },
    /// The origin answered with a non-2xx status, to be mirrored as-is
    OriginFailure {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
}

pub struct PreviewService {
    cache: Arc<dyn ImageCache>,
    origin: Arc<dyn OriginClient>,
    parser: PreviewPathParser,
    jpeg_quality: u8,
}

impl PreviewService {
    pub fn new(
        cache: Arc<dyn ImageCache>,
        origin: Arc<dyn OriginClient>,
        jpeg_quality: u8,
        max_dimension: u32,
    ) -> AppResult<Self> {
        let parser = PreviewPathParser::new(max_dimension)
            .map_err(|e| AppError::configuration(format!("invalid preview path pattern: {e}")))?;

        Ok(Self {
            cache,
            origin,
            parser,
            jpeg_quality,
        })
    }

    pub async fn preview(&self, request: PreviewRequest) -> PreviewResult<Preview> {
        let start = Instant::now();
        let target = self.parser.parse(&request.path_and_query)?;
        let url = origin_url(&target.origin)?;
        let key = CacheKey::from_url(&url);

        // Width and height are not part of the key: a slot holding another
        // size is a miss and gets overwritten with this request's size
        let (width, height) = target.size.dimensions();
        if let Some(image) = self.cache.get_sized(&key, width, height).await {
            let jpeg = self.encode(image).await?;
            debug!(
                key = %key,
                size = %target.size,
                duration_ms = start.elapsed().as_millis(),
                "Preview served from cache"
            );
            return Ok(Preview::Cached { jpeg });
        }

        debug!(
            key = %key,
            origin = %redact_credentials(&url),
            size = %target.size,
            "Preview cache miss"
        );

        let response = self
            .origin
            .fetch(OriginRequest {
                url,
                method: request.method,
                headers: request.headers,
                body: request.body,
            })
            .await?;

        if !response.status.is_success() {
            info!(
                origin = %redact_credentials(&response.url),
                status = response.status.as_u16(),
                "Origin returned an error status, mirroring it"
            );
            return Ok(Preview::OriginFailure {
                status: response.status,
                headers: response.headers,
                body: response.body,
            });
        }

        let image = Arc::new(transform(response.body, &response.url, target.size).await?);
        self.cache.save(key.clone(), Arc::clone(&image)).await?;
        let jpeg = self.encode(image).await?;

        info!(
            key = %key,
            origin = %redact_credentials(&response.url),
            size = %target.size,
            bytes = jpeg.len(),
            duration_ms = start.elapsed().as_millis(),
            "Preview generated"
        );

        Ok(Preview::Fetched {
            jpeg,
            origin_url: response.url,
        })
    }

    pub async fn clear_cache(&self) -> CacheResult<usize> {
        self.cache.clear().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    async fn encode(&self, image: Arc<DynamicImage>) -> PreviewResult<Bytes> {
        let quality = self.jpeg_quality;
        tokio::task::spawn_blocking(move || imaging::encode_jpeg(&image, quality))
            .await
            .map_err(|e| PreviewError::Task {
                message: e.to_string(),
            })?
            .map(Bytes::from)
            .map_err(PreviewError::Encode)
    }
}

/// Decode origin bytes and crop/scale them on the blocking pool
async fn transform(body: Bytes, source: &Url, size: TargetSize) -> PreviewResult<DynamicImage> {
    let source = redact_credentials(source);

    tokio::task::spawn_blocking(move || {
        let image = imaging::decode(&body).map_err(|e| match e {
            ImageError::Unsupported(_) => PreviewError::UnsupportedMedia {
                url: source,
                source: e,
            },
            other => PreviewError::Decode {
                url: source,
                source: other,
            },
        })?;
        Ok(imaging::resize(&image, size))
    })
    .await
    .map_err(|e| PreviewError::Task {
        message: e.to_string(),
    })?
}
