use serde_json::Value;

/// Longest server message kept for display.
const MAX_MESSAGE_CHARS: usize = 200;

/// Normalized failure of a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    NetworkTimeout,
    /// The service could not be reached (DNS, refused connection, reset).
    #[error("Network error: {0}")]
    NetworkError(String),
    /// The credential is missing or was rejected (HTTP 401).
    #[error("Not signed in or session expired")]
    Unauthorized,
    /// Any other non-2xx answer.
    #[error("{}", describe_status(*status, message.as_deref()))]
    ApiError {
        status: u16,
        message: Option<String>,
    },
    /// A 2xx answer whose body could not be read or decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The request body could not be encoded.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message supplied by the service, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::ApiError { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

fn describe_status(status: u16, message: Option<&str>) -> String {
    match message {
        Some(message) => format!("HTTP {status}: {message}"),
        None => format!("HTTP {status}"),
    }
}

/// Pull a human-readable message out of an error body.
///
/// JSON bodies are searched for `message`, `msg`, `error` and the first
/// `errors[].msg`; other text is used as-is.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(truncate(trimmed));
    };
    if let Some(text) = value.as_str() {
        return non_blank(text);
    }
    let named = ["message", "msg", "error"]
        .into_iter()
        .find_map(|key| value.get(key).and_then(Value::as_str).and_then(non_blank));
    if named.is_some() {
        return named;
    }
    value
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(|first| first.get("msg"))
        .and_then(Value::as_str)
        .and_then(non_blank)
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| truncate(trimmed))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
    cut.push('…');
    cut
}
