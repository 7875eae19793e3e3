/// HTTP transport shared by the series fetcher and the chat backend.
///
/// Wraps a synchronous `ureq` agent bound to the configured base URL. Each
/// call is a single request with no retry; the timeout is whatever the
/// transport defaults to unless `api.timeout_ms` is set.
///
/// Errors are classified into [`FetchError`] variants so callers can log a
/// precise reason while still handling every failure the same way.
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::schema::ApiConfig;
use crate::error::{FetchError, FetchResult};

/// Synchronous JSON client for the dashboard backend.
///
/// Cheap to clone: the underlying agent shares its connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    timeout: Option<Duration>,
}

impl ApiClient {
    /// Build a client from the resolved `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        Self::new(&config.base_url, timeout)
    }

    /// Build a client for an explicit base URL.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            base_url: normalize_base_url(base_url),
            agent: builder.build(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// Absolute URLs are passed through untouched so that a descriptor may
    /// point at a different host.
    pub fn endpoint_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// `GET url` and parse the body as JSON.
    pub fn get_json(&self, url: &str) -> FetchResult<Value> {
        let result = self.agent.get(url).call();
        read_json(url, result)
    }

    /// `POST url` with a JSON body and parse the response body as JSON.
    pub fn post_json<T: Serialize>(&self, url: &str, body: &T) -> FetchResult<Value> {
        let result = self.agent.post(url).send_json(body);
        read_json(url, result)
    }
}

/// Strip trailing slashes and pin `localhost` to IPv4.
///
/// On some platforms `localhost` resolves to `::1` first, which stalls when
/// the backend only binds to IPv4.
fn normalize_base_url(base_url: &str) -> String {
    base_url
        .trim()
        .trim_end_matches('/')
        .replace("://localhost", "://127.0.0.1")
}

fn read_json(url: &str, result: Result<ureq::Response, ureq::Error>) -> FetchResult<Value> {
    // Error statuses still carry a body; the payload decides the outcome.
    let resp = match result {
        Ok(resp) | Err(ureq::Error::Status(_, resp)) => resp,
        Err(ureq::Error::Transport(transport)) => {
            return Err(FetchError::Network {
                url: url.to_string(),
                message: transport.to_string(),
            });
        }
    };

    let body = resp.into_string().map_err(|e| FetchError::Network {
        url: url.to_string(),
        message: format!("failed to read body: {e}"),
    })?;

    serde_json::from_str(&body).map_err(|e| FetchError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })
}
