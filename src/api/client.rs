use log::{debug, error};
use thiserror::Error;

use super::types::ApiRequest;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status} from {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },
    #[error("transport error: {0}")]
    Transport(String),
}

/// The server side of every action. Only "did the request settle OK" is observed.
///
/// Requests may be in flight concurrently.
pub trait MailApi: Send + Sync + 'static {
    fn send(&self, request: &ApiRequest) -> Result<(), ApiError>;
}

pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        // No timeouts: a request that never answers simply never settles.
        let agent = ureq::AgentBuilder::new().build();
        ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn url_for(&self, request: &ApiRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }
}

impl MailApi for ApiClient {
    fn send(&self, request: &ApiRequest) -> Result<(), ApiError> {
        let url = self.url_for(request);
        debug!("[API] GET {}", url);

        match self.agent.get(&url).call() {
            Ok(resp) => {
                debug!("[API] {} settled with {}", request.name(), resp.status());
                Ok(())
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                error!("[API] HTTP error {} for {}", status, url);
                Err(ApiError::Status {
                    status,
                    path: request.path(),
                    body: truncate_str(&body, 200).to_string(),
                })
            }
            Err(e) => {
                error!("[API] Connection error: {}", e);
                Err(ApiError::Transport(e.to_string()))
            }
        }
    }
}

/// Truncate on a char boundary.
fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
