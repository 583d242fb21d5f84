//! HTTP utilities for ARM REST API calls

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A non-2xx response from Resource Manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API request failed: {status}{}", describe_code(.code, .message))]
pub struct ArmError {
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
}

fn describe_code(code: &Option<String>, message: &Option<String>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!(" ({}: {})", code, message),
        (Some(code), None) => format!(" ({})", code),
        (None, Some(message)) => format!(" ({})", message),
        (None, None) => String::new(),
    }
}

impl ArmError {
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND.as_u16()
    }

    /// Decode the standard `{"error": {"code", "message"}}` envelope
    fn from_body(status: StatusCode, body: &str) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            error: Option<ErrorDetail>,
        }

        let detail = serde_json::from_str::<Envelope>(body)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_default();

        Self {
            status: status.as_u16(),
            code: detail.code,
            message: detail.message,
        }
    }
}

/// `error` object used by ARM error responses and async operation bodies
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// True if `error` wraps a 404 from Resource Manager
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<ArmError>())
        .any(ArmError::is_not_found)
}

/// A successful response, body already decoded
#[derive(Debug, Clone)]
pub struct ArmResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Value::Null` when the body was empty
    pub body: Value,
}

impl ArmResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// HTTP client wrapper for ARM API calls
#[derive(Clone, Debug)]
pub struct ArmHttpClient {
    client: Client,
}

impl ArmHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("armkit/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Send a request and decode the JSON response
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<ArmResponse> {
        let request_id = uuid::Uuid::new_v4();
        tracing::debug!("{} {} (request id {})", method, url, request_id);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header("x-ms-client-request-id", request_id.to_string());

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.context("failure sending request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .context("failure reading response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(ArmError::from_body(status, &text).into());
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).context("failure responding to request: invalid JSON")?
        };

        Ok(ArmResponse {
            status,
            headers,
            body,
        })
    }
}

/// Format an ARM API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_arm_error(error: &anyhow::Error) -> String {
    if let Some(arm) = error.chain().find_map(|c| c.downcast_ref::<ArmError>()) {
        return match arm.status {
            401 => "Authentication failed. Run 'az login' or check AZURE_* credentials.".to_string(),
            403 => "Permission denied. Check your Azure role assignments.".to_string(),
            404 => "Resource not found.".to_string(),
            409 => "Resource conflict. The resource may already exist or be in use.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            400 => match &arm.code {
                Some(code) => format!("Invalid request ({}). Check your parameters.", code),
                None => "Invalid request. Check your parameters.".to_string(),
            },
            500..=599 => "Azure service temporarily unavailable. Please try again.".to_string(),
            _ => "Request failed. Check your network connection and try again.".to_string(),
        };
    }

    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 500 bytes total]"));
        assert!(sanitized.len() < 300);
    }

    #[test]
    fn test_arm_error_decodes_envelope() {
        let err = ArmError::from_body(
            StatusCode::NOT_FOUND,
            r#"{"error": {"code": "ResourceNotFound", "message": "gone"}}"#,
        );
        assert_eq!(err.code.as_deref(), Some("ResourceNotFound"));
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "API request failed: 404 (ResourceNotFound: gone)"
        );
    }

    #[test]
    fn test_arm_error_tolerates_garbage() {
        let err = ArmError::from_body(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(err.code, None);
        assert_eq!(err.to_string(), "API request failed: 502");
    }

    #[test]
    fn test_is_not_found_through_context() {
        let err = anyhow::Error::new(ArmError {
            status: 404,
            code: None,
            message: None,
        })
        .context("secrets.SecretsClient#Get");
        assert!(is_not_found(&err));
        assert_eq!(format_arm_error(&err), "Resource not found.");
    }
}
