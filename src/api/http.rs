//! HTTP utilities for the cluster-manager REST API
//!
//! A thin wrapper around `reqwest` with one request entry point. Error
//! responses carry a structured body `{"code": ..., "level": ...,
//! "desc": ...}` which is decoded into [`Error::Api`] so callers can
//! match on the machine-readable code.

use reqwest::{Client, Method};
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        // The cut must land on a char boundary, not mid-codepoint.
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..cut],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Decode an error response into [`Error::Api`].
///
/// The service reports errors as `{"code": "...", "level": "error",
/// "desc": "..."}`; responses that do not match fall back to the raw
/// body as the description.
fn error_from_response(status: u16, body: &str) -> Error {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |key: &str| -> Option<String> {
        parsed
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };
    Error::Api {
        status,
        code: field("code").unwrap_or_else(|| "UNKNOWN".to_string()),
        desc: field("desc").unwrap_or_else(|| sanitize_for_log(body)),
    }
}

/// HTTP client wrapper for the cluster-manager API
#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub(crate) fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("stackware-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Perform one request and decode the body.
    ///
    /// An empty successful body decodes to `Value::Null` (the service
    /// answers some deletes and accepts with `204 No Content`).
    pub(crate) async fn request(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Token {token}"));
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(error_from_response(status.as_u16(), &text));
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_structured_body() {
        let err = error_from_response(404, r#"{"code": "LOG_NOT_FOUND", "level": "error", "desc": "log file not found"}"#);
        match err {
            Error::Api { status, code, desc } => {
                assert_eq!(status, 404);
                assert_eq!(code, "LOG_NOT_FOUND");
                assert_eq!(desc, "log file not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_from_plain_body() {
        let err = error_from_response(500, "internal server error");
        match err {
            Error::Api { status, code, desc } => {
                assert_eq!(status, 500);
                assert_eq!(code, "UNKNOWN");
                assert_eq!(desc, "internal server error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
        assert!(sanitized.len() < body.len());
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        // A multi-byte character straddling the truncation point must
        // not split the string mid-codepoint.
        let body = format!("{}é{}", "x".repeat(199), "y".repeat(100));
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));

        let body = format!("{}日本語", "x".repeat(198));
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
    }
}
