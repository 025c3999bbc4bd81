use std::time::{Duration, Instant};

use crate::config::BenchConfig;
use crate::error::FtabError;
use crate::http::request::PreparedRequest;
use crate::http::response::{response_wire_size, ResponseData};

/// Shared reqwest client used by every worker of a run. Clones share the
/// connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

/// Builder for [`HttpClient`].
///
/// Redirects are not followed by default: a `302` is a status like any other
/// and is judged against the expected status of the run.
pub struct HttpClientBuilder {
    timeout: Duration,
    max_idle_per_host: usize,
    follow_redirects: bool,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            max_idle_per_host: 2048,
            follow_redirects: false,
            user_agent: format!("ftab/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_idle_per_host(mut self, n: usize) -> Self {
        self.max_idle_per_host = n;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, FtabError> {
        let redirect = if self.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .redirect(redirect)
            .user_agent(self.user_agent)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(HttpClient { inner })
    }
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with the run's timeout and pool size.
    pub fn from_config(config: &BenchConfig) -> Result<Self, FtabError> {
        Self::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .max_idle_per_host(config.max_idle_per_host)
            .build()
    }

    /// Send `req` and read the whole (decoded) body.
    ///
    /// Any transport failure, including a timeout while reading the body,
    /// becomes [`FtabError::Request`] for `req.url`. The status is returned
    /// as is.
    pub async fn send(&self, req: &PreparedRequest) -> Result<ResponseData, FtabError> {
        let method = reqwest::Method::from_bytes(req.method.as_bytes()).map_err(|_| {
            FtabError::Validation(format!("invalid request method {:?}", req.method))
        })?;

        let mut builder = self.inner.request(method, req.url.as_str());
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !req.body.is_empty() {
            builder = builder.body(req.body.clone());
        }

        let failed = |source: reqwest::Error| FtabError::Request {
            url: req.url.clone(),
            source,
        };

        let start = Instant::now();
        let response = builder.send().await.map_err(failed)?;
        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.bytes().await.map_err(failed)?.to_vec();
        let elapsed = start.elapsed();

        Ok(ResponseData {
            size_bytes: response_wire_size(status, &headers, body.len()),
            status,
            headers,
            body,
            elapsed,
        })
    }
}
