use courier_shared::{Exchange, SendReply};
use tracing::{debug, info, warn};

use crate::credential::Credential;
use crate::message::{flatten_history, now_timestamp, Message};
use crate::state::ConversationState;
use crate::transport::{ChatTransport, TransportError};
use crate::view::{ConversationView, ScrollBehavior};

pub const DEFAULT_TYPING_PLACEHOLDER: &str = "Bot is typing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    LoadingHistory,
    /// User message and placeholder are appended, the request is out.
    Sending,
    /// Reply or failure is being applied.
    Reconciling,
}

/// Proof that a history load was started. Handed back to `apply_history`.
#[derive(Debug)]
pub struct PendingHistory {
    _started: (),
}

/// One admitted send, from optimistic append until reconciliation.
#[derive(Debug)]
pub struct PendingSend {
    cycle: u64,
    message: String,
}

impl PendingSend {
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The text as typed, which is what goes over the wire.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Owns the conversation for one activation of the chat screen.
///
/// Sends are serialized: while one is outstanding (and while history is
/// loading) further submits are no-ops. Each cycle removes its own typing
/// placeholder and nobody else's.
pub struct ConversationController<T, V> {
    transport: T,
    view: V,
    credential: Credential,
    state: ConversationState,
    input: String,
    phase: Phase,
    placeholder: String,
    history_requested: bool,
    in_flight: Option<u64>,
    next_cycle: u64,
    last_error: Option<String>,
}

impl<T, V> ConversationController<T, V>
where
    T: ChatTransport,
    V: ConversationView,
{
    /// Mounts with an empty conversation. The credential comes from a passed
    /// `SessionGate`.
    pub fn mount(credential: Credential, transport: T, view: V) -> Self {
        info!("Conversation mounted");
        Self {
            transport,
            view,
            credential,
            state: ConversationState::new(),
            input: String::new(),
            phase: Phase::Idle,
            placeholder: DEFAULT_TYPING_PLACEHOLDER.to_string(),
            history_requested: false,
            in_flight: None,
            next_cycle: 0,
            last_error: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Message from the most recent failed send, cleared when the next one is admitted.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    // ---- history -------------------------------------------------------

    /// Starts the one history load this activation gets.
    pub fn begin_history_load(&mut self) -> Option<PendingHistory> {
        if self.history_requested || self.phase != Phase::Idle {
            return None;
        }
        self.history_requested = true;
        self.phase = Phase::LoadingHistory;
        debug!("Loading history");
        Some(PendingHistory { _started: () })
    }

    /// Replaces the conversation with the fetched history. A failed fetch
    /// leaves it as it was.
    pub fn apply_history(
        &mut self,
        _pending: PendingHistory,
        result: Result<Vec<Exchange>, TransportError>,
    ) {
        match result {
            Ok(exchanges) => {
                debug!("Loaded {} exchanges", exchanges.len());
                self.state.replace_all(flatten_history(exchanges));
                self.scroll();
            }
            Err(e) => {
                warn!("Failed to load chat history: {}", e);
            }
        }
        self.phase = Phase::Idle;
    }

    pub async fn load_history(&mut self) {
        let Some(pending) = self.begin_history_load() else {
            return;
        };
        let result = self.transport.history(&self.credential).await;
        self.apply_history(pending, result);
    }

    // ---- send ----------------------------------------------------------

    /// Admission and optimistic append.
    ///
    /// Returns `None` without touching anything when the input is blank or
    /// another operation is in flight.
    pub fn begin_send(&mut self) -> Option<PendingSend> {
        if self.input.trim().is_empty() {
            return None;
        }
        if self.phase != Phase::Idle {
            debug!("Send ignored, {:?} in progress", self.phase);
            return None;
        }

        self.phase = Phase::Sending;
        let cycle = self.next_cycle;
        self.next_cycle += 1;
        self.in_flight = Some(cycle);
        self.last_error = None;

        let message = std::mem::take(&mut self.input);
        let now = now_timestamp();
        self.state.append_pair(
            Message::user(message.clone(), now.clone()),
            Message::typing(self.placeholder.clone(), now),
        );
        self.scroll();

        debug!(cycle, "Send admitted");
        Some(PendingSend { cycle, message })
    }

    /// Reconciliation: swap the placeholder for the reply, or roll back both
    /// optimistic entries.
    pub fn finish_send(&mut self, pending: PendingSend, result: Result<SendReply, TransportError>) {
        if self.in_flight != Some(pending.cycle) {
            warn!(cycle = pending.cycle, "Ignoring reply for a send that is not in flight");
            return;
        }
        self.phase = Phase::Reconciling;

        match result {
            Ok(reply) => {
                self.state
                    .replace_last(Message::bot(reply.response, reply.timestamp));
            }
            Err(e) => {
                warn!("Chat failed: {}", e);
                self.state.remove_last_two();
                self.last_error = Some(e.to_string());
            }
        }
        self.scroll();

        self.in_flight = None;
        self.phase = Phase::Idle;
        debug!(cycle = pending.cycle, "Send reconciled");
    }

    /// Runs a whole send cycle. Returns whether the send was admitted.
    pub async fn submit(&mut self) -> bool {
        let Some(pending) = self.begin_send() else {
            return false;
        };
        let result = self.transport.send(&self.credential, pending.message()).await;
        self.finish_send(pending, result);
        true
    }

    fn scroll(&mut self) {
        self.view.scroll_to_latest(ScrollBehavior::Smooth);
    }
}
