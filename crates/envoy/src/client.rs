use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use courier_session::{ChatTransport, Credential, TransportError};
use courier_shared::{Exchange, SendReply, SendRequest};
use tracing::debug;

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `timeout` of `None` leaves requests unbounded on the client side.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Maps non-success statuses onto the transport error taxonomy.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(TransportError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

fn http_error(e: reqwest::Error) -> TransportError {
    TransportError::Http(e.to_string())
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn history(&self, credential: &Credential) -> Result<Vec<Exchange>, TransportError> {
        let url = self.url("/chat/history");
        debug!(%url, "GET history");

        let response = self.client
            .get(&url)
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(http_error)?;

        check_status(response)
            .await?
            .json::<Vec<Exchange>>()
            .await
            .map_err(http_error)
    }

    async fn send(&self, credential: &Credential, message: &str) -> Result<SendReply, TransportError> {
        let url = self.url("/chat/");
        debug!(%url, "POST message");

        let request = SendRequest {
            message: message.to_string(),
        };

        let response = self.client
            .post(&url)
            .bearer_auth(credential.token())
            .json(&request)
            .send()
            .await
            .map_err(http_error)?;

        check_status(response)
            .await?
            .json::<SendReply>()
            .await
            .map_err(http_error)
    }
}
