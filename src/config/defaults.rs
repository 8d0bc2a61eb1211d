/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SHUTDOWN_TIMEOUT: &str = "3s";
pub const DEFAULT_MAX_REQUEST_BODY: usize = 1024 * 1024; // 1MB forwarded to origin

// Cache defaults
pub const DEFAULT_CACHE_PATH: &str = "./data/cache";
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

// Origin client defaults
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "30s";

// Image defaults
pub const DEFAULT_JPEG_QUALITY: u8 = 75;
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

pub fn default_port() -> u16 {
    DEFAULT_PORT
}

pub fn default_shutdown_timeout() -> String {
    DEFAULT_SHUTDOWN_TIMEOUT.to_string()
}

pub fn default_max_request_body() -> usize {
    DEFAULT_MAX_REQUEST_BODY
}

pub fn default_cache_path() -> String {
    DEFAULT_CACHE_PATH.to_string()
}

pub fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

pub fn default_connect_timeout() -> String {
    DEFAULT_CONNECT_TIMEOUT.to_string()
}

pub fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

pub fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

pub fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

pub fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
