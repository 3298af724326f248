//! Conversation state for one chat session: the ordered message list, the in-flight
//! guard around backend calls, and the scroll policy applied to each change.
pub mod scroll;
pub mod suggestions;
#[cfg(test)]
pub(crate) mod testing;

use log::{ debug, error, info, warn };
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use crate::api::{ ApiError, ChatApi };
use crate::history::ChatHistory;
use crate::models::chat::{ ChatRequest, ChatResponse, ConversationMessage, Sender };
use crate::platform::{ Clock, Confirm, NotificationKind, Notifier };
use crate::storage::StorageError;
use crate::text::format_timestamp;
use self::scroll::{ AppendCause, ScrollAction, ScrollPolicy, Viewport };

pub const FALLBACK_ANSWER: &str =
    "I'm having trouble connecting right now. Please check if the backend server is running.";
pub const CLEAR_PROMPT: &str = "Are you sure you want to clear the chat history?";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("a question is already waiting for an answer")]
    Busy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Input was empty; nothing was appended or sent.
    Ignored,
    Answered,
    Failed,
}

/// Change notifications for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum ConversationEvent {
    MessageAppended {
        message: ConversationMessage,
        scroll: ScrollAction,
    },
    TypingChanged {
        typing: bool,
        scroll: ScrollAction,
    },
    PlaceholderChanged {
        visible: bool,
    },
    Cleared,
}

/// Proof that a user message was appended and a request may now be issued.
#[must_use]
#[derive(Debug)]
pub struct PendingExchange {
    question: String,
}

impl PendingExchange {
    pub fn question(&self) -> &str {
        &self.question
    }
}

pub struct Collaborators {
    pub api: Arc<dyn ChatApi>,
    pub history: ChatHistory,
    pub notifier: Arc<dyn Notifier>,
    pub confirm: Arc<dyn Confirm>,
    pub clock: Arc<dyn Clock>,
}

pub struct ConversationManager {
    messages: Vec<ConversationMessage>,
    state: ExchangeState,
    typing: bool,
    placeholder_visible: bool,
    scroll: ScrollPolicy,
    session_id: String,
    deps: Collaborators,
    events: Option<mpsc::UnboundedSender<ConversationEvent>>,
}

impl ConversationManager {
    pub fn new(deps: Collaborators, session_id: String, scroll: ScrollPolicy) -> Self {
        Self {
            messages: Vec::new(),
            state: ExchangeState::Idle,
            typing: false,
            placeholder_visible: true,
            scroll,
            session_id,
            deps,
            events: None,
        }
    }

    /// Starts delivering change events to a new receiver, replacing any previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ConversationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn placeholder_visible(&self) -> bool {
        self.placeholder_visible
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn last_answer(&self) -> Option<&ConversationMessage> {
        self.messages.iter().rev().find(|m| m.sender == Sender::Assistant)
    }

    fn emit(&self, event: ConversationEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is rendering.
            let _ = tx.send(event);
        }
    }

    fn set_placeholder(&mut self, visible: bool) {
        if self.placeholder_visible != visible {
            self.placeholder_visible = visible;
            self.emit(ConversationEvent::PlaceholderChanged { visible });
        }
    }

    fn set_typing(&mut self, typing: bool) {
        if self.typing == typing {
            return;
        }
        self.typing = typing;
        let scroll = if typing { self.scroll.decide(AppendCause::Remote) } else { ScrollAction::Stay };
        self.emit(ConversationEvent::TypingChanged { typing, scroll });
    }

    fn push(&mut self, message: ConversationMessage, cause: AppendCause) {
        let scroll = self.scroll.decide(cause);
        self.messages.push(message.clone());
        self.emit(ConversationEvent::MessageAppended { message, scroll });
    }

    fn now_label(&self) -> String {
        format_timestamp(&self.deps.clock.now())
    }

    /// Replays persisted history into an empty conversation. Returns how many
    /// messages were restored.
    pub async fn restore(&mut self) -> usize {
        if !self.messages.is_empty() {
            warn!("Ignoring restore into a conversation that already has messages");
            return 0;
        }
        let saved = self.deps.history.load().await;
        if saved.is_empty() {
            return 0;
        }
        self.set_placeholder(false);
        let count = saved.len();
        for (i, message) in saved.into_iter().enumerate() {
            let scroll = if i + 1 == count { ScrollAction::ToBottom } else { ScrollAction::Stay };
            self.messages.push(message.clone());
            self.emit(ConversationEvent::MessageAppended { message, scroll });
        }
        self.scroll.reset();
        info!("Restored {} messages from history", count);
        count
    }

    /// Appends the user's message immediately. Whitespace-only input is ignored.
    pub fn append_user_message(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.set_placeholder(false);
        let message = ConversationMessage::user(text, self.now_label());
        self.push(message, AppendCause::Local);
        true
    }

    /// Appends the user message and moves to `Sending`. `Ok(None)` means the input was empty.
    pub fn begin_exchange(&mut self, text: &str) -> Result<Option<PendingExchange>, ConversationError> {
        if self.state == ExchangeState::Sending {
            return Err(ConversationError::Busy);
        }
        if !self.append_user_message(text) {
            return Ok(None);
        }
        self.state = ExchangeState::Sending;
        self.set_typing(true);
        Ok(Some(PendingExchange { question: text.trim().to_string() }))
    }

    pub async fn request_answer(&self, question: &str) -> Result<ChatResponse, ApiError> {
        let request = ChatRequest {
            question: question.to_string(),
            session_id: self.session_id.clone(),
        };
        self.deps.api.ask(&request).await
    }

    /// Appends the answer (or the fallback error message), returns to `Idle` and persists.
    pub async fn complete_exchange(
        &mut self,
        pending: PendingExchange,
        result: Result<ChatResponse, ApiError>
    ) -> ExchangeOutcome {
        self.set_typing(false);
        let timestamp = self.now_label();
        let outcome = match result {
            Ok(response) => {
                debug!(
                    "Answer for '{}': confidence={:?} match_type={:?}",
                    pending.question,
                    response.confidence,
                    response.match_type
                );
                self.push(ConversationMessage::assistant(response, timestamp), AppendCause::Remote);
                ExchangeOutcome::Answered
            }
            Err(e) => {
                error!("Error getting response: {}", e);
                self.push(ConversationMessage::assistant_error(FALLBACK_ANSWER, timestamp), AppendCause::Remote);
                self.deps.notifier.notify(
                    NotificationKind::Error,
                    &format!("Connection error. Make sure the backend is reachable at {}", self.deps.api.base_url())
                );
                ExchangeOutcome::Failed
            }
        };
        self.state = ExchangeState::Idle;
        self.persist().await;
        outcome
    }

    /// One full exchange: optimistic append, backend call, answer or fallback, persist.
    pub async fn send(&mut self, text: &str) -> Result<ExchangeOutcome, ConversationError> {
        let Some(pending) = self.begin_exchange(text)? else {
            return Ok(ExchangeOutcome::Ignored);
        };
        let result = self.request_answer(pending.question()).await;
        Ok(self.complete_exchange(pending, result).await)
    }

    /// Writes the retained tail of the conversation to durable storage. A full store
    /// drops the persisted history entirely.
    pub async fn persist(&self) {
        match self.deps.history.save(&self.messages).await {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded { needed, quota }) => {
                warn!("Chat history needs {} bytes, quota is {}; discarding it", needed, quota);
                if let Err(e) = self.deps.history.discard().await {
                    error!("Failed to discard chat history: {}", e);
                }
                self.deps.notifier.notify(NotificationKind::Warning, "Chat history cleared due to storage limit");
            }
            Err(e) => {
                error!("Failed to save chat history: {}", e);
                self.deps.notifier.notify(NotificationKind::Error, "Failed to save chat history");
            }
        }
    }

    /// Empties the conversation and its persisted copy after the user confirms.
    pub async fn clear(&mut self) -> bool {
        if !self.deps.confirm.confirm(CLEAR_PROMPT).await {
            return false;
        }
        self.messages.clear();
        self.scroll.reset();
        let removed = self.deps.history.clear().await;
        self.emit(ConversationEvent::Cleared);
        self.set_placeholder(true);
        match removed {
            Ok(()) => self.deps.notifier.notify(NotificationKind::Success, "Chat history cleared"),
            Err(e) => {
                error!("Failed to clear chat history: {}", e);
                self.deps.notifier.notify(NotificationKind::Error, "Failed to clear chat history");
            }
        }
        true
    }

    pub fn viewport_scrolled(&mut self, viewport: Viewport) {
        self.scroll.on_scroll(viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::testing::{ BrokenStore, FakeChatApi };
    use crate::platform::{ AutoConfirm, FixedClock, RecordingNotifier };
    use crate::storage::{ KeyValueStore, MemoryStore, CHAT_HISTORY_KEY };
    use chrono::{ Local, TimeZone };

    struct Harness {
        manager: ConversationManager,
        store: Arc<MemoryStore>,
        notifier: RecordingNotifier,
        api: Arc<FakeChatApi>,
    }

    fn manager_over(api: FakeChatApi, store: Arc<dyn KeyValueStore>, notifier: &RecordingNotifier) -> ConversationManager {
        let clock: Arc<dyn Clock> = Arc::new(
            FixedClock(Local.with_ymd_and_hms(2024, 5, 1, 14, 7, 0).unwrap())
        );
        let deps = Collaborators {
            api: Arc::new(api),
            history: ChatHistory::new(store, clock.clone(), 100),
            notifier: Arc::new(notifier.clone()),
            confirm: Arc::new(AutoConfirm(true)),
            clock,
        };
        ConversationManager::new(deps, "session_1_abcdefghi".into(), ScrollPolicy::default())
    }

    fn harness_with(api: FakeChatApi, store: Arc<MemoryStore>, confirm: bool, cap: usize) -> Harness {
        let clock: Arc<dyn Clock> = Arc::new(
            FixedClock(Local.with_ymd_and_hms(2024, 5, 1, 14, 7, 0).unwrap())
        );
        let api = Arc::new(api);
        let notifier = RecordingNotifier::new();
        let deps = Collaborators {
            api: api.clone(),
            history: ChatHistory::new(store.clone(), clock.clone(), cap),
            notifier: Arc::new(notifier.clone()),
            confirm: Arc::new(AutoConfirm(confirm)),
            clock,
        };
        Harness {
            manager: ConversationManager::new(deps, "session_1_abcdefghi".into(), ScrollPolicy::default()),
            store,
            notifier,
            api,
        }
    }

    fn harness(api: FakeChatApi) -> Harness {
        harness_with(api, Arc::new(MemoryStore::new()), true, 100)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ConversationEvent>) -> Vec<ConversationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn append_user_message_grows_by_one() {
        let mut h = harness(FakeChatApi::offline());
        assert!(h.manager.append_user_message("How much are school fees?"));
        assert_eq!(h.manager.messages().len(), 1);
        let last = h.manager.messages().last().unwrap();
        assert_eq!(last.sender, Sender::User);
        assert_eq!(last.timestamp, "2:07 PM");
        assert!(!h.manager.placeholder_visible());
    }

    #[test]
    fn whitespace_input_is_a_no_op() {
        let mut h = harness(FakeChatApi::offline());
        let mut rx = h.manager.subscribe();
        for input in ["", "   ", "\n\t "] {
            assert!(!h.manager.append_user_message(input));
        }
        assert!(h.manager.messages().is_empty());
        assert!(h.manager.placeholder_visible());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn empty_send_makes_no_request() {
        let mut h = harness(FakeChatApi::answering("a", 1.0, "exact"));
        assert_eq!(h.manager.send("  ").await, Ok(ExchangeOutcome::Ignored));
        assert!(h.api.requests().is_empty());
        assert_eq!(h.store.get(CHAT_HISTORY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn medicine_scenario_is_answered_and_persisted() {
        let mut h = harness(FakeChatApi::answering("200 for Medicine", 0.92, "exact"));
        let outcome = h.manager.send("What is the cut-off mark for Medicine?").await.unwrap();
        assert_eq!(outcome, ExchangeOutcome::Answered);

        let messages = h.manager.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "What is the cut-off mark for Medicine?");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].text, "200 for Medicine");
        assert_eq!(messages[1].confidence, Some(0.92));
        assert_eq!(messages[1].match_type.as_deref(), Some("exact"));

        let requests = h.api.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].session_id, "session_1_abcdefghi");

        let persisted = crate::history::load(h.store.as_ref()).await;
        assert_eq!(persisted, messages.to_vec());
        assert!(h.notifier.entries().is_empty());
        assert_eq!(h.manager.state(), ExchangeState::Idle);
    }

    #[tokio::test]
    async fn network_failure_substitutes_error_message() {
        let mut h = harness(FakeChatApi::offline());
        let outcome = h.manager.send("How do I check admission status?").await.unwrap();
        assert_eq!(outcome, ExchangeOutcome::Failed);

        let messages = h.manager.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert!(messages[1].is_error);
        assert_eq!(messages[1].text, FALLBACK_ANSWER);
        assert_eq!(h.notifier.kinds(), vec![NotificationKind::Error]);

        let persisted = crate::history::load(h.store.as_ref()).await;
        assert_eq!(persisted.len(), 2);
        assert!(persisted[1].is_error);
    }

    #[tokio::test]
    async fn server_error_status_is_a_failed_exchange() {
        let mut h = harness(FakeChatApi::failing_with(500));
        assert_eq!(h.manager.send("fees?").await, Ok(ExchangeOutcome::Failed));
        assert_eq!(h.manager.messages().len(), 2);
        assert!(h.manager.messages()[1].is_error);
    }

    #[tokio::test]
    async fn second_send_while_pending_is_rejected() {
        let mut h = harness(FakeChatApi::answering("ok", 0.9, "exact"));
        let pending = h.manager.begin_exchange("first").unwrap().unwrap();
        assert_eq!(h.manager.state(), ExchangeState::Sending);
        assert!(h.manager.is_typing());
        assert_eq!(h.manager.begin_exchange("second").unwrap_err(), ConversationError::Busy);
        assert_eq!(h.manager.messages().len(), 1);

        let result = h.manager.request_answer(pending.question()).await;
        h.manager.complete_exchange(pending, result).await;
        assert_eq!(h.manager.state(), ExchangeState::Idle);
        assert!(!h.manager.is_typing());
        assert!(h.manager.begin_exchange("second").unwrap().is_some());
    }

    #[tokio::test]
    async fn events_follow_scroll_policy() {
        let mut h = harness(FakeChatApi::answering("ok", 0.9, "exact"));
        let mut rx = h.manager.subscribe();

        h.manager.viewport_scrolled(Viewport { scroll_top: 0, scroll_height: 2000, client_height: 500 });
        let pending = h.manager.begin_exchange("question").unwrap().unwrap();
        // Reader scrolls up while the answer is pending.
        h.manager.viewport_scrolled(Viewport { scroll_top: 100, scroll_height: 2000, client_height: 500 });
        let result = h.manager.request_answer(pending.question()).await;
        h.manager.complete_exchange(pending, result).await;

        let events = drain(&mut rx);
        let scrolls: Vec<(String, ScrollAction)> = events
            .iter()
            .filter_map(|e| match e {
                ConversationEvent::MessageAppended { message, scroll } => Some((message.text.clone(), *scroll)),
                ConversationEvent::TypingChanged { typing: true, scroll } => Some(("typing".into(), *scroll)),
                _ => None,
            })
            .collect();
        assert_eq!(
            scrolls,
            vec![
                ("question".to_string(), ScrollAction::ToBottom),
                ("typing".to_string(), ScrollAction::ToBottom),
                ("ok".to_string(), ScrollAction::Stay)
            ]
        );
        assert_eq!(events[0], ConversationEvent::PlaceholderChanged { visible: false });
    }

    #[tokio::test]
    async fn restore_replays_in_order_and_hides_placeholder() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut first = harness_with(FakeChatApi::answering("a1", 0.8, "exact"), store.clone(), true, 100);
            first.manager.send("q1").await.unwrap();
            first.manager.send("q2").await.unwrap();
        }
        let mut h = harness_with(FakeChatApi::offline(), store, true, 100);
        let mut rx = h.manager.subscribe();
        assert_eq!(h.manager.restore().await, 4);
        let texts: Vec<&str> = h.manager.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["q1", "a1", "q2", "a1"]);
        assert!(!h.manager.placeholder_visible());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 5);
        assert!(matches!(events.last(), Some(ConversationEvent::MessageAppended { scroll: ScrollAction::ToBottom, .. })));
    }

    #[tokio::test]
    async fn restore_of_empty_history_keeps_placeholder() {
        let mut h = harness(FakeChatApi::offline());
        assert_eq!(h.manager.restore().await, 0);
        assert!(h.manager.placeholder_visible());
    }

    #[tokio::test]
    async fn persisted_history_is_capped() {
        let mut h = harness_with(FakeChatApi::answering("a", 0.5, "similar"), Arc::new(MemoryStore::new()), true, 3);
        h.manager.send("q1").await.unwrap();
        h.manager.send("q2").await.unwrap();
        assert_eq!(h.manager.messages().len(), 4);
        let persisted: Vec<String> = crate::history::load(h.store.as_ref()).await
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(persisted, vec!["a", "q2", "a"]);
    }

    #[tokio::test]
    async fn quota_failure_drops_history_and_warns() {
        let store = Arc::new(MemoryStore::with_quota(Some(200)));
        store.set(CHAT_HISTORY_KEY, "[]").await.unwrap();
        let mut h = harness_with(
            FakeChatApi::answering(&"long answer ".repeat(40), 0.9, "exact"),
            store,
            true,
            100
        );
        h.manager.send("q").await.unwrap();
        assert_eq!(h.manager.messages().len(), 2);
        assert_eq!(h.store.get(CHAT_HISTORY_KEY).await.unwrap(), None);
        assert_eq!(
            h.notifier.entries(),
            vec![(NotificationKind::Warning, "Chat history cleared due to storage limit".to_string())]
        );
    }

    #[tokio::test]
    async fn clear_empties_memory_and_storage() {
        let mut h = harness(FakeChatApi::answering("a", 0.9, "exact"));
        h.manager.send("q").await.unwrap();
        let mut rx = h.manager.subscribe();

        assert!(h.manager.clear().await);
        assert!(h.manager.messages().is_empty());
        assert!(h.manager.placeholder_visible());
        assert_eq!(h.store.get(CHAT_HISTORY_KEY).await.unwrap(), None);
        assert_eq!(
            drain(&mut rx),
            vec![ConversationEvent::Cleared, ConversationEvent::PlaceholderChanged { visible: true }]
        );
        assert_eq!(h.notifier.kinds(), vec![NotificationKind::Success]);
    }

    #[tokio::test]
    async fn clear_without_confirmation_keeps_everything() {
        let mut h = harness_with(FakeChatApi::answering("a", 0.9, "exact"), Arc::new(MemoryStore::new()), false, 100);
        h.manager.send("q").await.unwrap();
        assert!(!h.manager.clear().await);
        assert_eq!(h.manager.messages().len(), 2);
        assert!(h.store.get(CHAT_HISTORY_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unwritable_store_reports_save_failure() {
        let notifier = RecordingNotifier::new();
        let mut manager = manager_over(FakeChatApi::answering("a", 0.9, "exact"), Arc::new(BrokenStore), &notifier);
        assert_eq!(manager.send("q").await, Ok(ExchangeOutcome::Answered));
        assert_eq!(manager.messages().len(), 2);
        assert_eq!(
            notifier.entries(),
            vec![(NotificationKind::Error, "Failed to save chat history".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_removal_is_not_reported_as_cleared() {
        let notifier = RecordingNotifier::new();
        let mut manager = manager_over(FakeChatApi::offline(), Arc::new(BrokenStore), &notifier);
        manager.append_user_message("q");
        assert!(manager.clear().await);
        assert!(manager.messages().is_empty());
        assert_eq!(
            notifier.entries(),
            vec![(NotificationKind::Error, "Failed to clear chat history".to_string())]
        );
    }

    #[tokio::test]
    async fn last_answer_finds_latest_assistant_message() {
        let mut h = harness(FakeChatApi::answering("fees vary", 0.7, "similar"));
        assert!(h.manager.last_answer().is_none());
        h.manager.send("fees?").await.unwrap();
        h.manager.append_user_message("thanks");
        assert_eq!(h.manager.last_answer().map(|m| m.text.as_str()), Some("fees vary"));
    }
}
