use super::{OutboundRequest, STATUS_ACCEPTED, Transport, TransportError};
use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_ROOT_URL: &str = "https://api.logmatic.io/v1/input";
pub const IP_TRACKING_HEADER: &str = "X-Logmatic-Add-IP";
pub const USER_AGENT_TRACKING_HEADER: &str = "X-Logmatic-Add-UserAgent";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Ingestion root; the API key is appended as the last path segment.
    pub root_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            root_url: DEFAULT_ROOT_URL.to_string(),
            timeout: Duration::from_secs(60),
            user_agent: format!("rask-log-shipper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: Duration,
}

#[derive(Debug, Default)]
struct ClientStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_response_time: AtomicU64,
}

impl ClientStats {
    fn record_request(&self, success: bool, response_time: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time
            .fetch_add(response_time.as_millis() as u64, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// `Transport` backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
    root_url: Url,
    stats: Arc<ClientStats>,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let root_url: Url = config
            .root_url
            .parse()
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", config.root_url)))?;
        if root_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(config.root_url.clone()));
        }

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            root_url,
            stats: Arc::new(ClientStats::default()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `<root-url>/<api-key>`, with the key percent-encoded as one segment.
    pub fn endpoint_for(&self, api_key: &str) -> Result<Url, TransportError> {
        let mut url = self.root_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| TransportError::InvalidUrl(self.config.root_url.clone()))?;
            segments.pop_if_empty().push(api_key);
        }
        Ok(url)
    }

    pub fn build_headers(
        &self,
        extra: &BTreeMap<String, String>,
    ) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidHeader(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        let total_requests = self.stats.total_requests.load(Ordering::Relaxed);
        let total_response_time = self.stats.total_response_time.load(Ordering::Relaxed);

        let average_response_time = if total_requests > 0 {
            Duration::from_millis(total_response_time / total_requests)
        } else {
            Duration::ZERO
        };

        ConnectionStats {
            total_requests,
            successful_requests: self.stats.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.stats.failed_requests.load(Ordering::Relaxed),
            average_response_time,
        }
    }

    fn prepare(&self, request: OutboundRequest) -> Result<RequestBuilder, TransportError> {
        let url = self.endpoint_for(&request.api_key)?;
        let headers = self.build_headers(&request.headers)?;

        debug!("POST {} ({} bytes)", self.root_url, request.body.len());

        Ok(self
            .client
            .post(url)
            .headers(headers)
            .timeout(self.config.timeout)
            .body(request.body))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<u16, TransportError>> {
        let prepared = self.prepare(request);
        let stats = self.stats.clone();

        Box::pin(async move {
            let builder = prepared?;
            let start = Instant::now();

            match builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    stats.record_request(status == STATUS_ACCEPTED, start.elapsed());
                    Ok(status)
                }
                Err(e) => {
                    stats.record_request(false, start.elapsed());
                    if e.is_timeout() {
                        Err(TransportError::Timeout)
                    } else {
                        Err(TransportError::RequestError(e))
                    }
                }
            }
        })
    }
}
