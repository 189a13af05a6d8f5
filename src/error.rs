//! Client error taxonomy with retry classification.
//!
//! Two tiers: transport failures (the service was unreachable) propagate
//! as [`Error::Transport`] so callers can tell them apart from service
//! rejections, which are mapped to the most specific [`ErrorKind`] a status
//! code supports.

use serde_json::Value;

/// A single field-level validation failure.
#[derive(Debug, Clone)]
pub struct FieldError {
    /// Field that failed validation (dotted path for nested entities)
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Validation error code
    pub code: String,
    /// The offending value, if one was present
    pub value: Option<Value>,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
            value,
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: [{}] {}", self.field, self.code, self.message)
    }
}

/// Classification of service-tier failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Authentication failed (401)
    Authentication,
    /// JWT has expired
    TokenExpired,
    /// JWT is invalid or malformed
    InvalidToken,
    /// Required credentials were not provided
    MissingCredentials,
    /// The request was invalid (400)
    BadRequest,
    /// Requested resource does not exist (404)
    NotFound,
    /// The request conflicts with current state (409)
    Conflict,
    /// Rate limit exceeded (429) - transient
    RateLimited,
    /// Service temporarily unavailable (503) - transient
    ServiceUnavailable,
    /// Server error (other 5xx) - transient
    Server,
    /// Any other non-2xx response
    Api,
    /// Local entity validation failed
    Validation,
}

impl ErrorKind {
    /// Check if this kind is transient and eligible for retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited | ErrorKind::ServiceUnavailable | ErrorKind::Server
        )
    }

    /// Coarse check covering every authentication-related kind.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            ErrorKind::Authentication
                | ErrorKind::TokenExpired
                | ErrorKind::InvalidToken
                | ErrorKind::MissingCredentials
        )
    }

    /// Coarse check covering every kind produced by a service response.
    pub fn is_api(&self) -> bool {
        matches!(
            self,
            ErrorKind::BadRequest
                | ErrorKind::NotFound
                | ErrorKind::Conflict
                | ErrorKind::RateLimited
                | ErrorKind::ServiceUnavailable
                | ErrorKind::Server
                | ErrorKind::Api
        )
    }

    /// Machine code reported when the response body carries none.
    pub fn default_code(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "AUTH_ERROR",
            ErrorKind::TokenExpired => "TOKEN_EXPIRED",
            ErrorKind::InvalidToken => "INVALID_TOKEN",
            ErrorKind::MissingCredentials => "MISSING_CREDENTIALS",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::Server => "SERVER_ERROR",
            ErrorKind::Api => "API_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Authentication => write!(f, "Authentication failed"),
            ErrorKind::TokenExpired => write!(f, "Token expired"),
            ErrorKind::InvalidToken => write!(f, "Invalid token"),
            ErrorKind::MissingCredentials => write!(f, "Missing credentials"),
            ErrorKind::BadRequest => write!(f, "Bad request"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::RateLimited => write!(f, "Rate limited"),
            ErrorKind::ServiceUnavailable => write!(f, "Service unavailable"),
            ErrorKind::Server => write!(f, "Server error"),
            ErrorKind::Api => write!(f, "API error"),
            ErrorKind::Validation => write!(f, "Validation failed"),
        }
    }
}

/// Map an HTTP status code to the most specific error kind available.
///
/// 503 wins over the generic 5xx kind; unmapped codes fall back to
/// [`ErrorKind::Api`].
pub fn classify_status(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::BadRequest,
        401 => ErrorKind::Authentication,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        429 => ErrorKind::RateLimited,
        503 => ErrorKind::ServiceUnavailable,
        500..=599 => ErrorKind::Server,
        _ => ErrorKind::Api,
    }
}

/// Error raised when the service rejects a request or local validation fails.
#[derive(Debug, Clone)]
pub struct ClientError {
    /// The kind of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Machine-readable code
    pub code: String,
    /// HTTP status, when the error came from a response
    pub status: Option<u16>,
    /// Raw response body kept for diagnostics (API kinds only)
    pub response_data: Option<Value>,
    /// Field-level details (Validation kind only)
    pub errors: Vec<FieldError>,
}

impl ClientError {
    fn with_kind(
        kind: ErrorKind,
        message: impl Into<String>,
        status: Option<u16>,
        response_data: Option<Value>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            code: kind.default_code().to_string(),
            status,
            response_data,
            errors: Vec::new(),
        }
    }

    /// Create a bad request error (400).
    pub fn bad_request(message: impl Into<String>, response_data: Option<Value>) -> Self {
        Self::with_kind(ErrorKind::BadRequest, message, Some(400), response_data)
    }

    /// Create an authentication error (401).
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Authentication, message, Some(401), None)
    }

    /// Create a not found error (404).
    pub fn not_found(message: impl Into<String>, response_data: Option<Value>) -> Self {
        Self::with_kind(ErrorKind::NotFound, message, Some(404), response_data)
    }

    /// Create a conflict error (409).
    pub fn conflict(message: impl Into<String>, response_data: Option<Value>) -> Self {
        Self::with_kind(ErrorKind::Conflict, message, Some(409), response_data)
    }

    /// Create a rate limit error (429).
    pub fn rate_limited(message: impl Into<String>, response_data: Option<Value>) -> Self {
        Self::with_kind(ErrorKind::RateLimited, message, Some(429), response_data)
    }

    /// Create a service unavailable error (503).
    pub fn service_unavailable(message: impl Into<String>, response_data: Option<Value>) -> Self {
        Self::with_kind(
            ErrorKind::ServiceUnavailable,
            message,
            Some(503),
            response_data,
        )
    }

    /// Create a server error (5xx other than 503).
    pub fn server(status: u16, message: impl Into<String>, response_data: Option<Value>) -> Self {
        Self::with_kind(ErrorKind::Server, message, Some(status), response_data)
    }

    /// Create a generic API error for a status with no dedicated kind,
    /// keeping the machine code the service reported.
    pub fn api(
        status: u16,
        code: impl Into<String>,
        message: impl Into<String>,
        response_data: Option<Value>,
    ) -> Self {
        Self {
            kind: ErrorKind::Api,
            message: message.into(),
            code: code.into(),
            status: Some(status),
            response_data,
            errors: Vec::new(),
        }
    }

    /// Create an error for a success status whose body could not be parsed.
    pub fn invalid_response(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Api,
            message: message.into(),
            code: "INVALID_RESPONSE".to_string(),
            status: Some(status),
            response_data: None,
            errors: Vec::new(),
        }
    }

    /// Create a token expired error.
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::TokenExpired, message, Some(401), None)
    }

    /// Create an invalid token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::InvalidToken, message, Some(401), None)
    }

    /// Create a missing credentials error.
    pub fn missing_credentials(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::MissingCredentials, message, Some(401), None)
    }

    /// Create a local validation error with field-level details.
    pub fn validation(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            code: ErrorKind::Validation.default_code().to_string(),
            status: None,
            response_data: None,
            errors,
        }
    }

    /// Dispatch a terminal non-2xx response to the most specific constructor.
    ///
    /// `code` is only kept for statuses with no dedicated kind; mapped kinds
    /// report their fixed machine code. The 401 path drops the body, matching
    /// the service's contract that authentication failures carry no payload.
    pub fn from_status(status: u16, message: &str, code: &str, body: Value) -> Self {
        match classify_status(status) {
            ErrorKind::BadRequest => Self::bad_request(message, Some(body)),
            ErrorKind::Authentication => Self::unauthorized(message),
            ErrorKind::NotFound => Self::not_found(message, Some(body)),
            ErrorKind::Conflict => Self::conflict(message, Some(body)),
            ErrorKind::RateLimited => Self::rate_limited(message, Some(body)),
            ErrorKind::ServiceUnavailable => Self::service_unavailable(message, Some(body)),
            ErrorKind::Server => Self::server(status, message, Some(body)),
            _ => Self::api(status, code, message, Some(body)),
        }
    }

    /// Check if this error is transient and eligible for retry.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {status})")?;
        }
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ClientError {}

/// Any failure a client operation can produce.
///
/// Transport failures are propagated as-is so callers can distinguish
/// "the service rejected the request" from "the service was unreachable".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service could not be reached or a response never arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the request, or local validation failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl Error {
    /// The taxonomy kind, when this is a service-tier error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Transport(_) => None,
            Error::Client(err) => Some(err.kind),
        }
    }
}
