pub mod controller;
pub mod credential;
pub mod gate;
pub mod message;
pub mod state;
pub mod transport;
pub mod view;

pub use controller::{ConversationController, PendingHistory, PendingSend, Phase, DEFAULT_TYPING_PLACEHOLDER};
pub use credential::{Credential, CredentialStore, MemoryCredentialStore, TOKEN_KEY};
pub use gate::{Navigator, SessionGate};
pub use message::{Message, Role};
pub use state::ConversationState;
pub use transport::{ChatTransport, TransportError};
pub use view::{ConversationView, ScrollBehavior};

pub use courier_shared::{Exchange, SendReply, SendRequest};
