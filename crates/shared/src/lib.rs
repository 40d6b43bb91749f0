pub mod chat;

pub use chat::{Exchange, SendReply, SendRequest};
