//! Thin HTTP client used by generated test programs and their checks.
//!
//! [`Client`] offers the four operations test programs need: GET, POST
//! with an arbitrary body, POST of form values, and HEAD. Each client is
//! built from an explicit [`ClientConfig`]; there is no process-wide
//! default client. The actual exchange goes through a [`Transport`], so
//! tests can substitute a recording fake for the network.
//!
//! ```rust,ignore
//! use tinyutil::httputil::{Client, ClientConfig, FormValues};
//!
//! let client = Client::new(&ClientConfig::default())?;
//! let mut form = FormValues::new();
//! form.add("foo", "quux");
//! form.add("bar", "baz");
//! let response = client.post_form("http://127.0.0.1:8080/", &form).await?;
//! ```

pub mod error;
pub mod transport;

pub use error::{HttpError, HttpErrorKind};
pub use reqwest::Method;
pub use transport::{ReqwestTransport, Request, Response, Transport};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Default `User-Agent` sent by clients.
pub const DEFAULT_USER_AGENT: &str = concat!("tinyutil/", env!("CARGO_PKG_VERSION"));

/// Content type used by [`Client::post_form`].
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Configuration for a [`Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Headers added to every request.
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

/// Form fields for [`Client::post_form`].
///
/// Keys are encoded in sorted order, and values under one key keep their
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Replaces all values under `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), vec![value.into()]);
    }

    /// Returns the first value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encodes the form as `application/x-www-form-urlencoded`.
    ///
    /// Follows the WHATWG form encoding: spaces become `+`, `*` is left as
    /// is and `~` becomes `%7E`. Some encoders do the opposite for those two
    /// characters; the decoded values are the same either way.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.values {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = Self::new();
        for (key, value) in iter {
            form.add(key, value);
        }
        form
    }
}

/// HTTP client.
///
/// Cloning is cheap; clones share one transport.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Creates a client backed by reqwest.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration holds an invalid header or the
    /// underlying client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, HttpError> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new(config)?)))
    }

    /// Creates a client over a custom transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Sends a prepared request.
    ///
    /// # Errors
    ///
    /// Returns the transport's error. Non-2xx statuses are returned as
    /// ordinary responses.
    pub async fn send(&self, request: Request) -> Result<Response, HttpError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        self.transport.round_trip(request).await
    }

    /// Issues a GET.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid URL or a failed exchange.
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.send(Request::new(Method::GET, url)?).await
    }

    /// Issues a POST with the given content type and body.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid URL or content type, or a failed exchange.
    pub async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: impl Into<Vec<u8>>,
    ) -> Result<Response, HttpError> {
        let request = Request::new(Method::POST, url)?
            .with_header("content-type", content_type)?
            .with_body(body);
        self.send(request).await
    }

    /// POSTs form values, url-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid URL or a failed exchange.
    pub async fn post_form(&self, url: &str, form: &FormValues) -> Result<Response, HttpError> {
        self.post(url, FORM_CONTENT_TYPE, form.encode()).await
    }

    /// Issues a HEAD. The returned body is empty.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid URL or a failed exchange.
    pub async fn head(&self, url: &str) -> Result<Response, HttpError> {
        self.send(Request::new(Method::HEAD, url)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::header::{HeaderMap, HeaderValue};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<Request>>,
    }

    impl RecordingTransport {
        fn recorded(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn round_trip(&self, request: Request) -> Result<Response, HttpError> {
            let body = if request.method == Method::HEAD {
                Vec::new()
            } else {
                b"want body".to_vec()
            };
            self.requests.lock().unwrap().push(request);

            let mut headers = HeaderMap::new();
            headers.insert("x-want-header", HeaderValue::from_static("want header value"));
            Ok(Response {
                status: 200,
                headers,
                body,
            })
        }
    }

    fn client() -> (Client, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        (Client::with_transport(transport.clone()), transport)
    }

    #[tokio::test]
    async fn get_sends_get_without_body() {
        let (client, transport) = client();

        let response = client.get("http://127.0.0.1:9/path").await.unwrap();

        assert_eq!(response.text(), "want body");
        let recorded = transport.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, Method::GET);
        assert_eq!(recorded[0].url.path(), "/path");
        assert!(recorded[0].body.is_none());
    }

    #[tokio::test]
    async fn post_sets_content_type_and_body() {
        let (client, transport) = client();

        client
            .post("http://127.0.0.1:9/", "text/plain", "want req body")
            .await
            .unwrap();

        let recorded = transport.recorded();
        assert_eq!(recorded[0].method, Method::POST);
        assert_eq!(recorded[0].headers.get("content-type").unwrap(), "text/plain");
        assert_eq!(recorded[0].body.as_deref(), Some(&b"want req body"[..]));
    }

    #[tokio::test]
    async fn post_form_encodes_sorted_fields() {
        let (client, transport) = client();
        let mut form = FormValues::new();
        form.add("foo", "quux");
        form.add("bar", "baz");

        client.post_form("http://127.0.0.1:9/", &form).await.unwrap();

        let recorded = transport.recorded();
        assert_eq!(
            recorded[0].headers.get("content-type").unwrap(),
            FORM_CONTENT_TYPE
        );
        assert_eq!(recorded[0].body.as_deref(), Some(&b"bar=baz&foo=quux"[..]));
    }

    #[tokio::test]
    async fn head_returns_headers_and_empty_body() {
        let (client, transport) = client();

        let response = client.head("http://127.0.0.1:9/").await.unwrap();

        assert_eq!(response.header("X-Want-Header"), Some("want header value"));
        assert!(response.body.is_empty());
        assert_eq!(transport.recorded()[0].method, Method::HEAD);
    }

    #[tokio::test]
    async fn invalid_url_never_reaches_transport() {
        let (client, transport) = client();

        let error = client.get("ftp://127.0.0.1/").await.unwrap_err();

        assert!(error.is_invalid_request());
        assert!(transport.recorded().is_empty());
    }

    #[test]
    fn form_values_encoding() {
        let form: FormValues = [("b", "2"), ("a", "x y"), ("b", "1")].into_iter().collect();
        assert_eq!(form.encode(), "a=x+y&b=2&b=1");
        assert_eq!(form.get("b"), Some("2"));
        assert_eq!(form.get("missing"), None);
    }

    #[test]
    fn form_values_encoding_of_tilde_and_star() {
        let form: FormValues = [("k~*", "a~*b")].into_iter().collect();
        assert_eq!(form.encode(), "k%7E*=a%7E*b");
    }

    #[test]
    fn form_values_set_replaces() {
        let mut form = FormValues::new();
        assert!(form.is_empty());
        form.add("k", "1");
        form.add("k", "2");
        form.set("k", "3");
        assert_eq!(form.encode(), "k=3");
    }

    #[test]
    fn client_config_builders() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("tinyutil-test/1")
            .with_default_header("x-trace", "1");

        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.user_agent, "tinyutil-test/1");
        assert_eq!(config.default_headers, vec![("x-trace".to_string(), "1".to_string())]);
    }

    #[test]
    fn default_user_agent_names_crate() {
        assert!(ClientConfig::default().user_agent.starts_with("tinyutil/"));
    }
}
