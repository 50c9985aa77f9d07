//! Request/response types and the transport seam.
//!
//! A [`Transport`] performs one HTTP exchange. [`ReqwestTransport`] is the
//! default; tests and alternative environments plug in their own.

use super::error::HttpError;
use super::ClientConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::fmt::Debug;
use url::Url;

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Absolute http or https URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a request with no headers and no body.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::InvalidUrl` if `url` does not parse or is not
    /// http or https.
    pub fn new(method: Method, url: &str) -> Result<Self, HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::invalid_url(url, e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(HttpError::invalid_url(
                    url,
                    format!("unsupported URL scheme: {scheme}; only http and https are allowed"),
                ));
            }
        }

        Ok(Self {
            method,
            url: parsed,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    /// Sets a header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::InvalidHeader` if the name or value is not valid HTTP.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A received HTTP response with its body fully read.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Returns the first value of header `name` (case-insensitive).
    ///
    /// Missing headers and non-text values yield `None`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Sends `request` and returns the complete response.
    ///
    /// # Errors
    ///
    /// Returns an `HttpError` if the request cannot be sent, times out, or
    /// the body cannot be read. Non-2xx statuses are not errors.
    async fn round_trip(&self, request: Request) -> Result<Response, HttpError>;
}

/// Transport backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport from client configuration.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::InvalidHeader` for a bad default header and
    /// `HttpError::ClientBuild` if the client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, HttpError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let (name, value) = parse_header(name, value)?;
            default_headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(default_headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| HttpError::client_build(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest::Client`.
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn round_trip(&self, request: Request) -> Result<Response, HttpError> {
        let url = request.url.to_string();

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::timeout(&url)
            } else {
                HttpError::request(&url, e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::timeout(&url)
                } else {
                    HttpError::body(e.to_string())
                }
            })?
            .to_vec();

        tracing::debug!(url = %url, status, body_bytes = body.len(), "http round trip");
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HttpError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| HttpError::invalid_header(name, e.to_string()))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| HttpError::invalid_header(name, e.to_string()))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_new_accepts_http_and_https() {
        assert!(Request::new(Method::GET, "http://127.0.0.1:8080/").is_ok());
        assert!(Request::new(Method::GET, "https://example.com/path?q=1").is_ok());
    }

    #[test]
    fn request_new_rejects_unparseable_url() {
        let error = Request::new(Method::GET, "not a url").unwrap_err();
        assert!(error.is_invalid_request());
    }

    #[test]
    fn request_new_rejects_other_schemes() {
        let error = Request::new(Method::GET, "file:///etc/passwd").unwrap_err();
        assert!(error.to_string().contains("unsupported URL scheme: file"));
    }

    #[test]
    fn request_with_header_and_body() {
        let request = Request::new(Method::POST, "http://localhost/")
            .unwrap()
            .with_header("Content-Type", "text/plain")
            .unwrap()
            .with_body("want req body");

        assert_eq!(request.headers.get("content-type").unwrap(), "text/plain");
        assert_eq!(request.body.as_deref(), Some(&b"want req body"[..]));
    }

    #[test]
    fn request_with_invalid_header_name_fails() {
        let error = Request::new(Method::GET, "http://localhost/")
            .unwrap()
            .with_header("want header key", "v")
            .unwrap_err();
        assert!(error.is_invalid_request());
    }

    #[test]
    fn response_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("x-want-header", HeaderValue::from_static("want header value"));
        let response = Response {
            status: 200,
            headers,
            body: Vec::new(),
        };

        assert_eq!(response.header("X-Want-Header"), Some("want header value"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn response_text_and_status() {
        let response = Response {
            status: 404,
            headers: HeaderMap::new(),
            body: b"not found".to_vec(),
        };
        assert_eq!(response.text(), "not found");
        assert!(!response.is_success());
    }

    #[test]
    fn reqwest_transport_rejects_bad_default_header() {
        let config = ClientConfig::new().with_default_header("bad name", "x");
        let error = ReqwestTransport::new(&config).unwrap_err();
        assert!(error.is_invalid_request());
    }

    #[test]
    fn reqwest_transport_builds_from_default_config() {
        assert!(ReqwestTransport::new(&ClientConfig::default()).is_ok());
    }
}
