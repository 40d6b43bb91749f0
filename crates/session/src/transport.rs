use async_trait::async_trait;
use courier_shared::{Exchange, SendReply};
use thiserror::Error;

use crate::credential::Credential;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("credential rejected by server")]
    Unauthorized,
}

/// Remote side of the conversation. Every call is bearer-authenticated.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Whole history in one call, newest exchange first.
    async fn history(&self, credential: &Credential) -> Result<Vec<Exchange>, TransportError>;

    async fn send(&self, credential: &Credential, message: &str) -> Result<SendReply, TransportError>;
}
