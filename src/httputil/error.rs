//! HTTP client error types.

use std::fmt;

/// Errors that can occur while building or sending an HTTP request.
///
/// This type uses `Box<HttpErrorKind>` to keep the error size small,
/// enabling efficient use in Result types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// The specific error that occurred (boxed for size efficiency)
    kind: Box<HttpErrorKind>,
}

/// Specific HTTP error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpErrorKind {
    /// The URL could not be parsed or uses an unsupported scheme.
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A header name or value is not valid HTTP.
    InvalidHeader {
        /// The header name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The underlying HTTP client could not be constructed.
    ClientBuild {
        /// Description of the failure
        reason: String,
    },

    /// The request could not be sent or no response was received.
    Request {
        /// The request URL
        url: String,
        /// Description of the failure
        reason: String,
    },

    /// The request exceeded the configured timeout.
    Timeout {
        /// The request URL
        url: String,
    },

    /// The response body could not be read.
    Body {
        /// Description of the failure
        reason: String,
    },
}

impl HttpError {
    /// Creates a new `HttpError` with the given kind.
    #[must_use]
    pub fn new(kind: HttpErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &HttpErrorKind {
        &self.kind
    }

    /// Creates an invalid URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        })
    }

    /// Creates an invalid header error.
    #[must_use]
    pub fn invalid_header(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::InvalidHeader {
            name: name.into(),
            reason: reason.into(),
        })
    }

    /// Creates a client build error.
    #[must_use]
    pub fn client_build(reason: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::ClientBuild {
            reason: reason.into(),
        })
    }

    /// Creates a request error.
    #[must_use]
    pub fn request(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Request {
            url: url.into(),
            reason: reason.into(),
        })
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout { url: url.into() })
    }

    /// Creates a body error.
    #[must_use]
    pub fn body(reason: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Body {
            reason: reason.into(),
        })
    }

    /// Returns true if the request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(*self.kind, HttpErrorKind::Timeout { .. })
    }

    /// Returns true if the request was rejected before anything was sent.
    #[must_use]
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            *self.kind,
            HttpErrorKind::InvalidUrl { .. } | HttpErrorKind::InvalidHeader { .. }
        )
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            HttpErrorKind::InvalidUrl { url, reason } => {
                write!(f, "invalid URL '{}': {}", url, reason)
            }
            HttpErrorKind::InvalidHeader { name, reason } => {
                write!(f, "invalid header '{}': {}", name, reason)
            }
            HttpErrorKind::ClientBuild { reason } => {
                write!(f, "failed to build HTTP client: {}", reason)
            }
            HttpErrorKind::Request { url, reason } => {
                write!(f, "request to '{}' failed: {}", url, reason)
            }
            HttpErrorKind::Timeout { url } => {
                write!(f, "request to '{}' timed out; raise the client timeout or check the server", url)
            }
            HttpErrorKind::Body { reason } => {
                write!(f, "failed to read response body: {}", reason)
            }
        }
    }
}

impl std::error::Error for HttpError {}
