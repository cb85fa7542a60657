use serde_json::Value;

/// Body of a non-success response, kept as JSON when it parses.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Empty,
    Json(Value),
    Text(String),
}

impl ErrorBody {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return ErrorBody::Empty;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

impl core::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ErrorBody::Empty => f.write_str("<empty>"),
            ErrorBody::Json(value) => write!(f, "{value}"),
            ErrorBody::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: ErrorBody },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("empty response body")]
    EmptyBody,
}

impl TransportError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            TransportError::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_body_prefers_json_then_text() {
        assert_eq!(
            ErrorBody::from_bytes(br#"{"error":"not_found"}"#),
            ErrorBody::Json(json!({ "error": "not_found" }))
        );
        assert_eq!(ErrorBody::from_bytes(b"boom"), ErrorBody::Text("boom".to_string()));
        assert_eq!(ErrorBody::from_bytes(b"  \n"), ErrorBody::Empty);
    }

    #[test]
    fn api_error_exposes_status_and_body() {
        let err = TransportError::Api {
            status: 503,
            body: ErrorBody::Text("down".to_string()),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "API error (503): down");
        assert_eq!(TransportError::EmptyBody.status(), None);
    }
}
