use async_trait::async_trait;
use reqwest::header::HeaderValue;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::types::ApiConfig;

/// Failures of a single request. The `Display` text is what ends up
/// in the error slot of the store.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum TransportError {
    #[error("{0}")]
    Request(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Could not parse response: {0}")]
    Decode(String),

    #[error("Invalid url '{0}'")]
    InvalidUrl(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, TransportError>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError>;
}

pub struct HttpTransport {
    base_url: url::Url,
    csrf_token: Option<HeaderValue>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let mut base_url = url::Url::parse(&config.base_url)
            .map_err(|_| TransportError::InvalidUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(config.base_url.clone()));
        }
        // Endpoint paths are joined below the base path
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let csrf_token = match &config.csrf_token {
            Some(token) => Some(
                HeaderValue::from_str(token)
                    .map_err(|e| TransportError::Request(format!("Invalid CSRF token: {e}")))?,
            ),
            None => None,
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self {
            base_url,
            csrf_token,
            client,
        })
    }

    fn url(&self, path: &str) -> Result<url::Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| TransportError::InvalidUrl(path.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.url(path)?;
        log::trace!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(request_error)?;
        parse_response(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.url(path)?;
        log::trace!("POST {url}");
        let mut request = self
            .client
            .post(url)
            .json(body);
        if let Some(token) = &self.csrf_token {
            request = request.header("X-CSRFToken", token.clone());
        }
        let response = request.send().await.map_err(request_error)?;
        parse_response(response).await
    }
}

fn request_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Request("timeout".to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

async fn parse_response(response: reqwest::Response) -> Result<Value, TransportError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(request_error)?;
    if !status.is_success() {
        let body: Option<Value> = serde_json::from_slice(&bytes).ok();
        return Err(status_error(status, body.as_ref()));
    }
    if bytes.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Prefer the message the server sent, fall back to the reason phrase
fn status_error(status: reqwest::StatusCode, body: Option<&Value>) -> TransportError {
    let message = body
        .and_then(|body| body.get("error").or_else(|| body.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
    TransportError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    #[derive(Clone, Debug, PartialEq)]
    pub struct Call {
        pub method: &'static str,
        pub path: String,
        pub body: Option<Value>,
    }

    enum Reply {
        Ready(Result<Value, TransportError>),
        Deferred(oneshot::Receiver<Result<Value, TransportError>>),
    }

    /// Records every call and answers with canned replies per path.
    /// Unknown paths fail with a 404.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        calls: Arc<Mutex<Vec<Call>>>,
        replies: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    }

    impl MockTransport {
        pub fn reply(&self, path: &str, response: Value) -> &Self {
            self.push(path, Reply::Ready(Ok(response)));
            self
        }

        pub fn fail(&self, path: &str, message: &str) -> &Self {
            self.push(
                path,
                Reply::Ready(Err(TransportError::Request(message.to_string()))),
            );
            self
        }

        /// The reply is only available once the returned sender fired
        pub fn defer(&self, path: &str) -> oneshot::Sender<Result<Value, TransportError>> {
            let (sender, receiver) = oneshot::channel();
            self.push(path, Reply::Deferred(receiver));
            sender
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, path: &str, reply: Reply) {
            self.replies
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default()
                .push_back(reply);
        }

        async fn answer(
            &self,
            method: &'static str,
            path: &str,
            body: Option<Value>,
        ) -> Result<Value, TransportError> {
            self.calls.lock().unwrap().push(Call {
                method,
                path: path.to_string(),
                body,
            });
            let reply = self
                .replies
                .lock()
                .unwrap()
                .get_mut(path)
                .and_then(VecDeque::pop_front);
            match reply {
                Some(Reply::Ready(result)) => result,
                Some(Reply::Deferred(receiver)) => receiver
                    .await
                    .unwrap_or_else(|_| Err(TransportError::Request("cancelled".to_string()))),
                None => Err(TransportError::Status {
                    status: 404,
                    message: "Not Found".to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(&self, path: &str) -> Result<Value, TransportError> {
            self.answer("GET", path, None).await
        }

        async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
            self.answer("POST", path, Some(body.clone())).await
        }
    }
}
