use chrono::{SecondsFormat, Utc};
use courier_shared::Exchange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Kept as the text it arrived with; server and client clocks use different formats.
    pub timestamp: String,
    /// Set only on the ephemeral placeholder shown while a reply is pending.
    pub is_typing: bool,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: timestamp.into(),
            is_typing: false,
        }
    }

    pub fn bot(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            timestamp: timestamp.into(),
            is_typing: false,
        }
    }

    pub fn typing(placeholder: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            is_typing: true,
            ..Self::bot(placeholder, timestamp)
        }
    }
}

/// Client clock in the same shape a browser's `toISOString` produces.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Turns server history (newest first) into a chronological flat message list.
///
/// Both messages derived from one exchange carry the exchange's timestamp;
/// the server records a single time per round trip.
pub fn flatten_history(exchanges: Vec<Exchange>) -> Vec<Message> {
    exchanges
        .into_iter()
        .rev()
        .flat_map(|exchange| {
            [
                Message::user(exchange.message, exchange.timestamp.clone()),
                Message::bot(exchange.response, exchange.timestamp),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(message: &str, response: &str, timestamp: &str) -> Exchange {
        Exchange {
            message: message.to_string(),
            response: response.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn flattens_newest_first_into_chronological_pairs() {
        let history = vec![exchange("hi", "hello", "T2"), exchange("yo", "hey", "T1")];

        let messages = flatten_history(history);

        assert_eq!(
            messages,
            vec![
                Message::user("yo", "T1"),
                Message::bot("hey", "T1"),
                Message::user("hi", "T2"),
                Message::bot("hello", "T2"),
            ]
        );
    }

    #[test]
    fn user_always_precedes_its_reply() {
        let history: Vec<Exchange> = (0..5)
            .rev()
            .map(|i| exchange(&format!("q{i}"), &format!("a{i}"), &format!("T{i}")))
            .collect();

        let messages = flatten_history(history);

        assert_eq!(messages.len(), 10);
        for (i, pair) in messages.chunks(2).enumerate() {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Bot);
            assert_eq!(pair[0].content, format!("q{i}"));
            assert_eq!(pair[1].content, format!("a{i}"));
            assert_eq!(pair[0].timestamp, pair[1].timestamp);
        }
    }

    #[test]
    fn empty_history_is_empty_conversation() {
        assert!(flatten_history(Vec::new()).is_empty());
    }

    #[test]
    fn typing_placeholder_is_a_bot_message() {
        let placeholder = Message::typing("Bot is typing...", "now");
        assert_eq!(placeholder.role, Role::Bot);
        assert!(placeholder.is_typing);
        assert!(!Message::bot("hi", "now").is_typing);
    }

    #[test]
    fn client_timestamp_is_rfc3339_utc() {
        let stamp = now_timestamp();
        assert!(stamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
