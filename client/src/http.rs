use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::debug;

use crate::query::Query;
use crate::{ClientError, ErrorResponse, LookupResponse, Result};

static HEADER_API_KEY: &'static str = "x-api-key";
static HEADER_AUTH_MODE: &'static str = "auth-mode";
static AUTH_MODE: &'static str = "rust-package";

static DEFAULT_HOST: &'static str = "api.apiverve.com/v1/zipcodes";
static DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Keys must be at least this long once hyphens and underscores are removed.
const MIN_API_KEY_LENGTH: usize = 32;

/// Client for the zip codes lookup endpoint.
///
/// Owns a pooled blocking HTTP session created at construction. The session
/// is released by [`Client::close`] or on drop, whichever comes first; after
/// `close` the client refuses further requests instead of reopening.
#[derive(Debug)]
pub struct Client {
    http: Option<reqwest::blocking::Client>,
    base_url: String,
    debug: bool,
}

/// Configuration surface for [`Client`].
///
/// Only the API key is required; everything else has a production default.
pub struct ClientBuilder {
    api_key: String,
    debug: bool,
    secure: bool,
    base_url: Option<String>,
    timeout: Duration,
}

impl ClientBuilder {
    /// Enable logging of requests and raw responses through `tracing`.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Use plain HTTP for the default endpoint. Ignored when a `base_url`
    /// override is set.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Override the endpoint URL, e.g. to point at a stub server in tests.
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Connect/read timeout for each request. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration and prepare the HTTP session. Performs no
    /// network I/O.
    pub fn build(self) -> Result<Client> {
        validate_api_key(&self.api_key)?;

        let base_url = match self.base_url {
            Some(url) => {
                url::Url::parse(&url)
                    .map_err(|e| ClientError::Configuration(format!("invalid base URL: {e}")))?;
                url.trim_end_matches('/').to_string()
            }
            None => {
                let scheme = if self.secure { "https" } else { "http" };
                format!("{}://{}", scheme, DEFAULT_HOST)
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            HEADER_API_KEY,
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ClientError::Configuration(format!("invalid API key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HEADER_AUTH_MODE, HeaderValue::from_static(AUTH_MODE));

        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP session: {e}")))?;

        Ok(Client {
            http: Some(http),
            base_url,
            debug: self.debug,
        })
    }
}

impl Client {
    /// Create a client with the production endpoint and default settings.
    pub fn new<S: Into<String>>(api_key: S) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Start configuring a client with the given API key.
    pub fn builder<S: Into<String>>(api_key: S) -> ClientBuilder {
        ClientBuilder {
            api_key: api_key.into(),
            debug: false,
            secure: true,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Endpoint URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether [`Client::close`] has released the session.
    pub fn is_closed(&self) -> bool {
        self.http.is_none()
    }

    /// Execute a lookup against the endpoint.
    ///
    /// The query is forwarded verbatim as URL query parameters; an empty
    /// query sends no query string and lets the server apply its defaults.
    /// Exactly one request is made per call, with no retries. Concurrent
    /// calls on the same instance share only the connection pool.
    pub fn execute(&self, query: &Query) -> Result<LookupResponse> {
        let http = self.http.as_ref().ok_or(ClientError::Closed)?;

        let url = match query.to_query_string() {
            Some(params) => format!("{}?{}", self.base_url, params),
            None => self.base_url.clone(),
        };

        if self.debug {
            debug!(method = "GET", url = %url, "sending lookup request");
        }

        let response = http.get(&url).send().map_err(ClientError::Transport)?;
        let status = response.status();
        let raw_body = response.text().map_err(ClientError::Transport)?;

        if self.debug {
            debug!(status = status.as_u16(), body = %raw_body, "received response");
        }

        handle_response(status, raw_body)
    }

    /// Release the HTTP session. Idempotent; a closed client fails fast on
    /// the next `execute` instead of reopening.
    pub fn close(&mut self) {
        if self.http.take().is_some() && self.debug {
            debug!("closing HTTP session");
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}

fn validate_api_key(api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(ClientError::Configuration(
            "API key is required. Get your API key at: https://apiverve.com".to_string(),
        ));
    }

    if !api_key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ClientError::Configuration(
            "invalid API key format: only letters, numbers, hyphens, and underscores are allowed"
                .to_string(),
        ));
    }

    let significant = api_key.chars().filter(|c| *c != '-' && *c != '_').count();
    if significant < MIN_API_KEY_LENGTH {
        return Err(ClientError::Configuration(
            "invalid API key: the key appears to be too short".to_string(),
        ));
    }

    Ok(())
}

/// Map an HTTP outcome onto the client error taxonomy.
fn handle_response(status: StatusCode, raw_body: String) -> Result<LookupResponse> {
    // An error envelope in the body wins over the HTTP status line: a 401
    // carrying {"status":"error","error":"Invalid API Key"} surfaces the
    // server's message, not the status text.
    if let Ok(envelope) = serde_json::from_str::<ErrorResponse>(&raw_body) {
        if envelope.status == "error" {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.error,
                body: raw_body,
            });
        }
    }

    if !status.is_success() {
        let message = match status.canonical_reason() {
            Some(reason) => format!("HTTP {}: {}", status.as_u16(), reason),
            None => format!("HTTP {} error", status.as_u16()),
        };
        return Err(ClientError::Http {
            status: status.as_u16(),
            message,
            body: raw_body,
        });
    }

    match serde_json::from_str::<LookupResponse>(&raw_body) {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ClientError::Format {
            status: status.as_u16(),
            body: raw_body,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_KEY: &'static str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn valid_key_constructs_ready_client() {
        let client = Client::new(TEST_KEY).unwrap();
        assert!(!client.is_closed());
        assert_eq!(client.base_url(), "https://api.apiverve.com/v1/zipcodes");
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = Client::new("").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = Client::new("   ").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn key_with_invalid_characters_is_rejected() {
        let err = Client::new("not a valid key!#0123456789abcdef").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn short_key_is_rejected() {
        let err = Client::new("too-short").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn separators_do_not_count_toward_key_length() {
        // 16 significant characters padded with hyphens.
        let err = Client::new("0123-4567-89ab-cdef-----------------").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));

        // 32 significant characters with separators interleaved.
        let client = Client::new("0123-4567-89ab-cdef_0123456789abcdef").unwrap();
        assert!(!client.is_closed());
    }

    #[test]
    fn empty_key_is_rejected_regardless_of_other_config() {
        let err = Client::builder("")
            .debug(true)
            .secure(false)
            .base_url("http://localhost:9")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn insecure_flag_downgrades_default_scheme() {
        let client = Client::builder(TEST_KEY).secure(false).build().unwrap();
        assert_eq!(client.base_url(), "http://api.apiverve.com/v1/zipcodes");
    }

    #[test]
    fn base_url_override_is_used_verbatim() {
        let client = Client::builder(TEST_KEY)
            .secure(false)
            .base_url("https://stub.example.com/v1/zipcodes")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://stub.example.com/v1/zipcodes");
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = Client::builder(TEST_KEY)
            .base_url("http://localhost:3000/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Client::builder(TEST_KEY)
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn execute_after_close_fails_fast() {
        let mut client = Client::new(TEST_KEY).unwrap();
        client.close();
        assert!(client.is_closed());

        let err = client.execute(&Query::zip("64082")).unwrap_err();
        assert!(matches!(err, ClientError::Closed));
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn close_twice_is_a_noop() {
        let mut client = Client::new(TEST_KEY).unwrap();
        client.close();
        client.close();
        assert!(client.is_closed());
    }

    #[test]
    fn handle_response_parses_success_envelope() {
        let body = r#"{"status":"ok","error":null,"data":{"zipcode":"64082","state_abbr":"MO","latitude":"38.850243","longitude":"-94.39570","city":"Lees Summit","state":"Missouri"}}"#;
        let parsed = handle_response(StatusCode::OK, body.to_string()).unwrap();
        assert_eq!(parsed.status, "ok");
        let record = parsed.data.unwrap();
        assert_eq!(record.city, "Lees Summit");
        assert_eq!(record.state_abbr, "MO");
    }

    #[test]
    fn handle_response_error_envelope_wins_over_status() {
        let body = r#"{"status":"error","error":"Invalid API Key","data":null}"#;
        let err = handle_response(StatusCode::UNAUTHORIZED, body.to_string()).unwrap_err();
        match err {
            ClientError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API Key");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn handle_response_non_2xx_without_envelope() {
        let err = handle_response(StatusCode::TOO_MANY_REQUESTS, String::new()).unwrap_err();
        assert_eq!(err.status_code(), Some(429));
        assert!(matches!(err, ClientError::Http { .. }));
    }

    #[test]
    fn handle_response_malformed_2xx_body() {
        let err = handle_response(StatusCode::OK, "<html>oops</html>".to_string()).unwrap_err();
        match err {
            ClientError::Format { status, body } => {
                assert_eq!(status, 200);
                assert_eq!(body, "<html>oops</html>");
            }
            other => panic!("expected Format error, got {:?}", other),
        }
    }
}
