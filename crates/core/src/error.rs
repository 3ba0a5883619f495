//! Unified error types for hubble.
//!
//! Cache failures never appear here: the cache layer degrades to a live
//! resolution instead of failing the request.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the hubble server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., missing URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch timeout or client construction failure.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP error response or network failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// The resource is not of the type the strategy expects (e.g., not HTML).
    #[error("UNEXPECTED_CONTENT_TYPE: {0}")]
    UnexpectedContentType(String),

    /// Image bytes could not be decoded.
    #[error("IMAGE_DECODE: {0}")]
    ImageDecode(String),

    /// A resolution strategy failed; carries the user-facing message.
    #[error("RESOLVE_FAILED: {0}")]
    ResolveFailed(String),
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::ResolveFailed(msg) => (-32000, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::UnexpectedContentType(msg) => (-32013, msg.clone()),
            Error::ImageDecode(msg) => (-32014, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ResolveFailed("Unable to determine content type.".to_string());
        assert!(err.to_string().contains("RESOLVE_FAILED"));
        assert!(err.to_string().contains("content type"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidInput("Expected url param, found none.".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
        assert_eq!(mcp_err.message, "Expected url param, found none.");
    }

    #[test]
    fn test_resolve_failed_keeps_user_message() {
        let mcp_err: McpError = Error::ResolveFailed("Unable to determine image size.".into()).into();
        assert_eq!(mcp_err.code.0, -32000);
        assert_eq!(mcp_err.message, "Unable to determine image size.");
    }
}
