use serde::{Deserialize, Serialize};

/// One recorded round trip as the server stores it: the user's message, the
/// assistant's reply and the single time the server stamped on the pair.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Exchange {
    pub message: String,
    pub response: String,
    pub timestamp: String,
}

// POST /chat/
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SendRequest {
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SendReply {
    pub response: String,
    pub timestamp: String,
}
