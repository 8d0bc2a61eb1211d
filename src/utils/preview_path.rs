//! Preview request path parsing
//!
//! A preview path has the shape `/{width}/{height}/{origin}` where `origin`
//! is the source image URL without its scheme, query string included.

use regex::Regex;
use std::fmt;

use crate::errors::PreviewError;

const PREVIEW_PATH_PATTERN: &str = r"^/(\d+)/(\d+)/(.*)$";

/// Requested output size, both sides at least one pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A parsed preview request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPath {
    pub size: TargetSize,
    /// Origin location without scheme, e.g. `example.com/a.jpg?v=1`
    pub origin: String,
}

#[derive(Debug, Clone)]
pub struct PreviewPathParser {
    pattern: Regex,
    max_dimension: u32,
}

impl PreviewPathParser {
    pub fn new(max_dimension: u32) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(PREVIEW_PATH_PATTERN)?,
            max_dimension,
        })
    }

    /// Parse a request path and query, e.g. `/300/200/example.com/a.jpg`
    pub fn parse(&self, path_and_query: &str) -> Result<PreviewPath, PreviewError> {
        let captures = self.pattern.captures(path_and_query).ok_or_else(|| {
            PreviewError::InvalidPath {
                path: path_and_query.to_string(),
            }
        })?;

        let width = self.parse_dimension("width", &captures[1])?;
        let height = self.parse_dimension("height", &captures[2])?;
        let origin = captures[3].to_string();

        if origin.is_empty() {
            return Err(PreviewError::InvalidPath {
                path: path_and_query.to_string(),
            });
        }

        Ok(PreviewPath {
            size: TargetSize { width, height },
            origin,
        })
    }

    fn parse_dimension(&self, field: &'static str, value: &str) -> Result<u32, PreviewError> {
        let invalid = |message: String| PreviewError::InvalidDimension {
            field,
            value: value.to_string(),
            message,
        };

        let parsed: u32 = value
            .parse()
            .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;

        if parsed == 0 {
            return Err(invalid("must be at least 1".to_string()));
        }
        if parsed > self.max_dimension {
            return Err(invalid(format!("must not exceed {}", self.max_dimension)));
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> PreviewPathParser {
        PreviewPathParser::new(4096).unwrap()
    }

    #[test]
    fn test_parse_valid_path() {
        let parsed = parser().parse("/300/200/example.com/images/a.jpg").unwrap();
        assert_eq!(
            parsed.size,
            TargetSize {
                width: 300,
                height: 200
            }
        );
        assert_eq!(parsed.origin, "example.com/images/a.jpg");
    }

    #[test]
    fn test_parse_keeps_query_in_origin() {
        let parsed = parser().parse("/10/10/example.com/a.jpg?v=3&x=y").unwrap();
        assert_eq!(parsed.origin, "example.com/a.jpg?v=3&x=y");
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        let paths = [
            "/",
            "/300",
            "/300/200",
            "/300/200/",
            "/abc/200/example.com/a.jpg",
            "300/200/example.com",
        ];
        for path in paths {
            assert!(
                matches!(parser().parse(path), Err(PreviewError::InvalidPath { .. })),
                "expected InvalidPath for {path}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_zero_and_oversized_dimensions() {
        assert!(matches!(
            parser().parse("/0/200/example.com/a.jpg"),
            Err(PreviewError::InvalidDimension { field: "width", .. })
        ));
        assert!(matches!(
            parser().parse("/200/0/example.com/a.jpg"),
            Err(PreviewError::InvalidDimension { field: "height", .. })
        ));
        assert!(matches!(
            parser().parse("/5000/200/example.com/a.jpg"),
            Err(PreviewError::InvalidDimension { field: "width", .. })
        ));
        assert!(matches!(
            parser().parse("/99999999999/200/example.com/a.jpg"),
            Err(PreviewError::InvalidDimension { .. })
        ));
    }
}
