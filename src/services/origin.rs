//! Origin image fetching
//!
//! Origins are addressed without a scheme. The fetcher tries plain `http`
//! first and retries once over `https` when the first attempt fails at the
//! transport level. Any HTTP response, including error statuses, ends the
//! attempt and is returned to the caller untouched.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName};
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::errors::{FetchError, FetchResult, TransportError};
use crate::utils::url::redact_credentials;

/// Headers managed by the HTTP client itself, never copied from the inbound request
const NON_FORWARDED_HEADERS: [HeaderName; 8] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
    header::ACCEPT_ENCODING,
    header::TE,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
];

/// A request to replay against the origin
#[derive(Debug, Clone)]
pub struct OriginRequest {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OriginRequest {
    /// A bodiless GET with no forwarded headers
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Whatever the origin answered, success or not
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Final URL after redirects
    pub url: Url,
}

#[async_trait]
pub trait OriginClient: Send + Sync {
    async fn fetch(&self, request: OriginRequest) -> FetchResult<OriginResponse>;
}

/// One request against one fully qualified URL, no retries
#[async_trait]
pub trait OriginTransport: Send + Sync {
    async fn send(
        &self,
        url: &Url,
        request: &OriginRequest,
    ) -> Result<OriginResponse, TransportError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl OriginTransport for HttpTransport {
    async fn send(
        &self,
        url: &Url,
        request: &OriginRequest,
    ) -> Result<OriginResponse, TransportError> {
        let mut headers = request.headers.clone();
        for name in NON_FORWARDED_HEADERS {
            headers.remove(&name);
        }

        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .headers(headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.without_url().to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(|source| FetchError::Body {
            url: redact_credentials(&url),
            source: source.without_url(),
        })?;

        Ok(OriginResponse {
            status,
            headers,
            body,
            url,
        })
    }
}

/// Origin client that falls back from http to https on transport errors
pub struct FallbackOriginClient<T = HttpTransport> {
    transport: T,
}

impl FallbackOriginClient<HttpTransport> {
    pub fn new(
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::with_transport(HttpTransport::new(
            connect_timeout,
            request_timeout,
        )?))
    }
}

impl<T: OriginTransport> FallbackOriginClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }
}

fn with_scheme(url: &Url, scheme: &str) -> FetchResult<Url> {
    let mut url = url.clone();
    url.set_scheme(scheme).map_err(|_| FetchError::InvalidUrl {
        url: redact_credentials(&url),
        message: format!("cannot use scheme '{scheme}'"),
    })?;
    Ok(url)
}

#[async_trait]
impl<T: OriginTransport> OriginClient for FallbackOriginClient<T> {
    async fn fetch(&self, request: OriginRequest) -> FetchResult<OriginResponse> {
        let http_url = with_scheme(&request.url, "http")?;
        debug!(
            url = %redact_credentials(&http_url),
            method = %request.method,
            "Fetching origin"
        );

        let response = match self.transport.send(&http_url, &request).await {
            Ok(response) => response,
            Err(TransportError::Fetch(e)) => return Err(e),
            Err(TransportError::Unreachable(http_error)) => {
                let https_url = with_scheme(&request.url, "https")?;
                debug!(
                    url = %redact_credentials(&https_url),
                    "HTTP fetch failed, trying HTTPS fallback: {}", http_error
                );

                match self.transport.send(&https_url, &request).await {
                    Ok(response) => {
                        debug!("Successfully fetched origin using HTTPS fallback");
                        response
                    }
                    Err(TransportError::Fetch(e)) => return Err(e),
                    Err(TransportError::Unreachable(https_error)) => {
                        return Err(FetchError::Unreachable {
                            url: redact_credentials(&http_url),
                            http_error,
                            https_error,
                        });
                    }
                }
            }
        };

        debug!(
            url = %redact_credentials(&response.url),
            status = response.status.as_u16(),
            bytes = response.body.len(),
            "Origin responded"
        );

        Ok(response)
    }
}
