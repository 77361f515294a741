//! Error types for calls to the remote Bluesky APIs

use bytes::Bytes;
use serde::Deserialize;
use smol_str::SmolStr;

/// Errors from the remote preference and profile collaborators
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ApiError {
    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Transport(
        #[from]
        #[diagnostic_source]
        TransportError,
    ),

    /// Request serialization failed
    #[error("{0}")]
    Encode(
        #[from]
        #[diagnostic_source]
        EncodeError,
    ),

    /// Response deserialization failed
    #[error("{0}")]
    Decode(
        #[from]
        #[diagnostic_source]
        DecodeError,
    ),

    /// HTTP error response
    #[error("HTTP {0}")]
    Http(
        #[from]
        #[diagnostic_source]
        HttpError,
    ),

    /// Error body returned by the XRPC endpoint
    #[error("XRPC error: {0}")]
    #[diagnostic(code(skynotify::api::xrpc))]
    Xrpc(#[from] GenericXrpcError),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(
        #[from]
        #[diagnostic_source]
        AuthError,
    ),
}

/// Transport-level errors that occur during HTTP communication
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TransportError {
    /// Failed to establish connection to server
    #[error("Connection error: {0}")]
    Connect(String),

    /// Request timed out
    #[error("Request timeout")]
    Timeout,

    /// Request construction failed (malformed URI, headers, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other transport error
    #[error("Transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<std::convert::Infallible> for TransportError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() || e.is_request() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Other(Box::new(e))
        }
    }
}

/// Request encoding errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EncodeError {
    /// JSON body serialization failed
    #[error("Failed to serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),
    /// Query string serialization failed
    #[error("Failed to serialize query: {0}")]
    Query(#[from] serde_html_form::ser::Error),
}

/// Response deserialization errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DecodeError {
    /// JSON deserialization failed
    #[error("Failed to deserialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
}

/// HTTP error response (non-2xx status codes without an XRPC error body)
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub struct HttpError {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response body if available
    pub body: Option<Bytes>,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(body) = &self.body {
            if let Ok(s) = std::str::from_utf8(body) {
                write!(f, ":\n{}", s)?;
            }
        }
        Ok(())
    }
}

/// Authentication and authorization errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AuthError {
    /// Access token has expired
    #[error("Access token expired")]
    #[diagnostic(help("sign in again to obtain a fresh access token"))]
    TokenExpired,

    /// Access token is invalid or malformed
    #[error("Invalid access token")]
    InvalidToken,

    /// The server rejected the request as unauthenticated
    #[error("No authentication provided")]
    NotAuthenticated,

    /// 401 with a `WWW-Authenticate` challenge
    #[error("Authentication error: {0:?}")]
    Other(http::HeaderValue),
}

/// Generic XRPC error body: `{"error": "...", "message": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct GenericXrpcError {
    /// Error code (e.g., "InvalidRequest")
    pub error: SmolStr,
    /// Optional error message with details
    pub message: Option<SmolStr>,
    /// XRPC method NSID that produced this error (context only; not serialized)
    #[serde(skip)]
    pub nsid: &'static str,
    /// HTTP method used (GET/POST) (context only; not serialized)
    #[serde(skip)]
    pub method: &'static str,
    /// HTTP status code (context only; not serialized)
    #[serde(skip)]
    pub http_status: http::StatusCode,
}

impl std::fmt::Display for GenericXrpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(msg) = &self.message {
            write!(
                f,
                "{}: {} (nsid={}, method={}, status={})",
                self.error, msg, self.nsid, self.method, self.http_status
            )
        } else {
            write!(
                f,
                "{} (nsid={}, method={}, status={})",
                self.error, self.nsid, self.method, self.http_status
            )
        }
    }
}

impl std::error::Error for GenericXrpcError {}

/// Result type for remote calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;
