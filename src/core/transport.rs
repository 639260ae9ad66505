//! HTTP Transport
//!
//! HTTP client interface and implementations for Instagram requests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{InstagramError, NetworkError, ProtocolError};

/// Default upper bound for a response body.
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 4 * 1024 * 1024;

/// HTTP GET request definition. Every Instagram call is a GET.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// GET request accepting JSON.
    pub fn get_json(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: [("accept".to_string(), "application/json".to_string())]
                .into_iter()
                .collect(),
            timeout: None,
        }
    }
}

/// HTTP response definition.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, InstagramError>;
}

/// Default reqwest-based HTTP transport.
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
    default_timeout: Duration,
    max_response_size: usize,
}

impl ReqwestHttpTransport {
    /// Create new transport with default settings.
    pub fn new() -> Result<Self, InstagramError> {
        Self::with_options(Duration::from_secs(30), DEFAULT_MAX_RESPONSE_SIZE)
    }

    /// Create transport with custom options.
    pub fn with_options(timeout: Duration, max_response_size: usize) -> Result<Self, InstagramError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                InstagramError::Network(NetworkError::ConnectionFailed {
                    message: format!("Failed to create HTTP client: {}", e),
                })
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
            max_response_size,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, InstagramError> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut req_builder = self.client.get(&request.url);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        req_builder = req_builder.timeout(timeout);

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                InstagramError::Network(NetworkError::Timeout { timeout })
            } else {
                InstagramError::Network(NetworkError::ConnectionFailed {
                    message: e.to_string(),
                })
            }
        })?;

        let status = response.status().as_u16();

        if (300..400).contains(&status) {
            let location = response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            return Err(InstagramError::Protocol(ProtocolError::UnexpectedRedirect {
                location,
            }));
        }

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string().to_lowercase(), v.to_string());
            }
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_response_size {
                return Err(InstagramError::Protocol(ProtocolError::ResponseTooLarge {
                    size: len as usize,
                }));
            }
        }

        let body = response.text().await.map_err(|e| {
            InstagramError::Protocol(ProtocolError::InvalidResponse {
                message: e.to_string(),
            })
        })?;

        if body.len() > self.max_response_size {
            return Err(InstagramError::Protocol(ProtocolError::ResponseTooLarge {
                size: body.len(),
            }));
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Mock HTTP transport for testing.
///
/// Responses registered with [`MockHttpTransport::on_path`] are matched against
/// the request URL path, so concurrent requests resolve independently of their
/// completion order. Unmatched requests fall back to the FIFO queue.
/// [`MockHttpTransport::delay_path`] holds matching requests on the tokio clock.
#[derive(Default)]
pub struct MockHttpTransport {
    routes: Mutex<Vec<(String, Result<HttpResponse, String>)>>,
    delays: Mutex<HashMap<String, Duration>>,
    responses: Mutex<Vec<HttpResponse>>,
    request_history: Mutex<Vec<HttpRequest>>,
}

impl MockHttpTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: HttpResponse) -> &Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Queue a JSON response.
    pub fn queue_json_response<T: serde::Serialize>(&self, status: u16, body: &T) -> &Self {
        self.queue_response(json_response(status, body))
    }

    /// Respond with a JSON body to every request whose URL path equals `path`.
    pub fn on_path<T: serde::Serialize>(&self, path: &str, status: u16, body: &T) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .push((path.to_string(), Ok(json_response(status, body))));
        self
    }

    /// Fail every request whose URL path equals `path` with a connection error.
    pub fn fail_path(&self, path: &str, message: &str) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .push((path.to_string(), Err(message.to_string())));
        self
    }

    /// Delay every response to requests whose URL path equals `path`.
    ///
    /// The response is chosen when the request arrives.
    pub fn delay_path(&self, path: &str, delay: Duration) -> &Self {
        self.delays.lock().unwrap().insert(path.to_string(), delay);
        self
    }

    /// Forget every registered route and delay.
    pub fn clear_routes(&self) -> &Self {
        self.routes.lock().unwrap().clear();
        self.delays.lock().unwrap().clear();
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        self.request_history.lock().unwrap().clone()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<HttpRequest> {
        self.request_history.lock().unwrap().last().cloned()
    }
}

fn json_response<T: serde::Serialize>(status: u16, body: &T) -> HttpResponse {
    HttpResponse {
        status,
        headers: [("content-type".to_string(), "application/json".to_string())]
            .into_iter()
            .collect(),
        body: serde_json::to_string(body).unwrap_or_default(),
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, InstagramError> {
        self.request_history.lock().unwrap().push(request.clone());

        let path = url::Url::parse(&request.url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();

        let routed = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, r)| r.clone());

        let result = match routed {
            Some(result) => result,
            None => {
                let mut queue = self.responses.lock().unwrap();
                if queue.is_empty() {
                    Err("No mock response available".to_string())
                } else {
                    Ok(queue.remove(0))
                }
            }
        };

        let delay = self.delays.lock().unwrap().get(&path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        result.map_err(|message| {
            InstagramError::Network(NetworkError::ConnectionFailed { message })
        })
    }
}
