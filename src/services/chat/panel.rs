use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::{broadcast, watch};

use crate::services::api::{ApiError, ChatBackend, FileAttachment};

use super::conversation::Conversation;
use super::manager::RequestRegistry;
use super::types::{FileDescriptor, Message, OutboundRequest, PanelEvent};

const EVENT_CAPACITY: usize = 64;

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct PanelSnapshot {
    pub open: bool,
    pub typing: bool,
    pub show_suggestions: bool,
    pub selected_file: Option<FileDescriptor>,
    pub messages: Vec<Message>,
}

struct PanelState {
    open: bool,
    conversation: Conversation,
}

struct PanelInner {
    backend: Arc<dyn ChatBackend>,
    // NOTE: std::sync::Mutex since neither lock is held across .await.
    // Lock order: state before registry.
    state: Mutex<PanelState>,
    registry: Mutex<RequestRegistry>,
    events: broadcast::Sender<PanelEvent>,
    in_flight: watch::Sender<usize>,
}

/// One assistant panel: a conversation plus the calls it has in flight.
///
/// Each send gets its own abort handle and becomes the current request.
/// Closing the panel, or sending again while a call is outstanding, aborts
/// the outstanding call; aborted calls never append a message.
#[derive(Clone)]
pub struct ChatPanel {
    inner: Arc<PanelInner>,
}

impl ChatPanel {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (in_flight, _) = watch::channel(0);
        Self {
            inner: Arc::new(PanelInner {
                backend,
                state: Mutex::new(PanelState {
                    open: false,
                    conversation: Conversation::new(),
                }),
                registry: Mutex::new(RequestRegistry::default()),
                events,
                in_flight,
            }),
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, PanelState>, ApiError> {
        self.inner
            .state
            .lock()
            .map_err(|_| ApiError::io("Chat panel state lock poisoned"))
    }

    fn lock_registry(&self) -> Result<MutexGuard<'_, RequestRegistry>, ApiError> {
        self.inner
            .registry
            .lock()
            .map_err(|_| ApiError::io("Chat panel registry lock poisoned"))
    }

    fn emit(&self, event: PanelEvent) {
        let _ = self.inner.events.send(event);
    }

    fn publish_in_flight(&self, conversation: &Conversation) {
        self.inner.in_flight.send_replace(conversation.pending_count());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> Result<PanelSnapshot, ApiError> {
        let state = self.lock_state()?;
        let conversation = &state.conversation;
        Ok(PanelSnapshot {
            open: state.open,
            typing: conversation.is_typing(),
            show_suggestions: conversation.show_suggestions(),
            selected_file: conversation.selected_file().map(FileDescriptor::from),
            messages: conversation.messages().to_vec(),
        })
    }

    pub fn open(&self) -> Result<(), ApiError> {
        let mut state = self.lock_state()?;
        if !state.open {
            state.open = true;
            self.emit(PanelEvent::Opened);
        }
        Ok(())
    }

    /// Close the panel: abort whatever is in flight and drop the file selection.
    pub fn close(&self) -> Result<(), ApiError> {
        let mut state = self.lock_state()?;
        let drained = self.lock_registry()?.drain();
        for (request_id, handle) in drained {
            handle.abort();
            if state.conversation.cancel(&request_id) {
                log::debug!("Aborted request {} on close", request_id);
                self.emit(PanelEvent::RequestCancelled { request_id });
            }
        }
        if state.conversation.remove_file().is_some() {
            self.emit(PanelEvent::FileRemoved);
        }
        state.open = false;
        self.emit(PanelEvent::TypingChanged { typing: false });
        self.emit(PanelEvent::Closed);
        self.publish_in_flight(&state.conversation);
        Ok(())
    }

    pub fn select_file(&self, file: FileAttachment) -> Result<(), ApiError> {
        let mut state = self.lock_state()?;
        let descriptor = FileDescriptor::from(&file);
        state.conversation.select_file(file);
        self.emit(PanelEvent::FileSelected { file: descriptor });
        Ok(())
    }

    pub fn remove_file(&self) -> Result<(), ApiError> {
        let mut state = self.lock_state()?;
        if state.conversation.remove_file().is_some() {
            self.emit(PanelEvent::FileRemoved);
        }
        Ok(())
    }

    /// Submit user input with the currently selected file (if any).
    ///
    /// Returns the request id, or `None` when the input was blank. Must be
    /// called from within a tokio runtime.
    pub fn send(&self, text: &str) -> Result<Option<String>, ApiError> {
        let request = {
            let mut state = self.lock_state()?;
            // Registry first: nothing may be appended unless the call can be tracked.
            let mut registry = self.lock_registry()?;
            let file = state.conversation.remove_file();
            let Some(request) = state.conversation.submit(text, file) else {
                return Ok(None);
            };
            state.open = true;

            if let Some(message) = state.conversation.last_message() {
                self.emit(PanelEvent::MessageAppended {
                    message: message.clone(),
                });
            }
            if request.file.is_some() {
                self.emit(PanelEvent::FileRemoved);
            }
            self.emit(PanelEvent::TypingChanged { typing: true });

            let (handle, registration) = AbortHandle::new_pair();
            let displaced = registry.insert_current(request.request_id.clone(), handle);
            drop(registry);
            if let Some((previous_id, previous)) = displaced {
                previous.abort();
                if state.conversation.cancel(&previous_id) {
                    log::debug!("Request {} superseded by {}", previous_id, request.request_id);
                    self.emit(PanelEvent::RequestCancelled {
                        request_id: previous_id,
                    });
                }
            }
            self.publish_in_flight(&state.conversation);

            let panel = self.clone();
            let request_for_task = request.clone();
            tokio::spawn(async move {
                let call = panel.clone().dispatch(request_for_task.clone());
                let outcome = match Abortable::new(call, registration).await {
                    Ok(outcome) => outcome,
                    Err(_aborted) => Err(ApiError::aborted("Request aborted")),
                };
                panel.complete(&request_for_task.request_id, outcome);
            });

            request
        };

        Ok(Some(request.request_id))
    }

    /// Submit one of the suggested prompts.
    pub fn send_suggestion(&self, index: usize) -> Result<Option<String>, ApiError> {
        let prompt = crate::services::prompts::SUGGESTED_PROMPTS
            .get(index)
            .ok_or_else(|| ApiError::invalid_input(format!("No suggestion #{}", index + 1)))?;
        self.send(prompt)
    }

    async fn dispatch(
        self,
        request: OutboundRequest,
    ) -> Result<crate::services::api::ChatReply, ApiError> {
        match request.file.as_ref() {
            Some(file) => {
                self.inner
                    .backend
                    .doc_chat(&request.question, file)
                    .await
            }
            None => self.inner.backend.chat(&request.question).await,
        }
    }

    fn complete(
        &self,
        request_id: &str,
        outcome: Result<crate::services::api::ChatReply, ApiError>,
    ) {
        let Ok(mut state) = self.lock_state() else {
            log::warn!("Dropping outcome for {}: panel state poisoned", request_id);
            return;
        };
        let was_typing = state.conversation.is_typing();
        if let Some(message) = state.conversation.resolve(request_id, outcome) {
            let message = message.clone();
            self.emit(PanelEvent::MessageAppended { message });
        }
        if was_typing && !state.conversation.is_typing() {
            self.emit(PanelEvent::TypingChanged { typing: false });
        }
        if let Ok(mut registry) = self.lock_registry() {
            registry.remove(request_id);
            log::debug!("{} chat request(s) still in flight", registry.len());
        }
        self.publish_in_flight(&state.conversation);
    }

    /// Wait until no call is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.in_flight.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    pub fn clear_conversation(&self) -> Result<(), ApiError> {
        let mut state = self.lock_state()?;
        state.conversation.clear();
        self.emit(PanelEvent::Cleared);
        Ok(())
    }

    /// Flip the reasoning flag of one message; unknown ids are ignored.
    pub fn toggle_reasoning(&self, message_id: &str) -> Result<Option<bool>, ApiError> {
        let mut state = self.lock_state()?;
        let shown = state.conversation.toggle_reasoning(message_id);
        if let Some(shown) = shown {
            self.emit(PanelEvent::ReasoningToggled {
                message_id: message_id.to_string(),
                shown,
            });
        }
        Ok(shown)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::services::api::ChatReply;
    use crate::services::chat::types::{MessageStatus, Sender};
    use crate::services::prompts;

    struct FakeBackend {
        reply: Result<ChatReply, ApiError>,
        gate: Option<Arc<Semaphore>>,
        chat_calls: AtomicUsize,
        doc_calls: AtomicUsize,
        last_question: Mutex<Option<String>>,
    }

    impl FakeBackend {
        fn replying(answer: &str, think: Option<&str>) -> Self {
            Self {
                reply: Ok(ChatReply {
                    answer: answer.to_string(),
                    think: think.map(str::to_string),
                }),
                gate: None,
                chat_calls: AtomicUsize::new(0),
                doc_calls: AtomicUsize::new(0),
                last_question: Mutex::new(None),
            }
        }

        fn failing(err: ApiError) -> Self {
            Self {
                reply: Err(err),
                ..Self::replying("", None)
            }
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        async fn respond(&self, question: &str) -> Result<ChatReply, ApiError> {
            *self.last_question.lock().unwrap() = Some(question.to_string());
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            self.reply.clone()
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn chat(&self, question: &str) -> Result<ChatReply, ApiError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            self.respond(question).await
        }

        async fn doc_chat(
            &self,
            question: &str,
            _file: &FileAttachment,
        ) -> Result<ChatReply, ApiError> {
            self.doc_calls.fetch_add(1, Ordering::SeqCst);
            self.respond(question).await
        }
    }

    fn panel_with(backend: FakeBackend) -> (ChatPanel, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        (ChatPanel::new(backend.clone()), backend)
    }

    async fn wait_for_calls(backend: &FakeBackend, expected: usize) {
        for _ in 0..200 {
            let calls = backend.chat_calls.load(Ordering::SeqCst)
                + backend.doc_calls.load(Ordering::SeqCst);
            if calls >= expected {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("backend never reached {expected} call(s)");
    }

    #[tokio::test]
    async fn test_hello_roundtrip() {
        let (panel, backend) = panel_with(FakeBackend::replying("Hi!", None));
        let initial = panel.snapshot().unwrap().messages.len();

        let request_id = panel.send("hello").unwrap();
        assert!(request_id.is_some());

        let during = panel.snapshot().unwrap();
        assert_eq!(during.messages.len(), initial + 1);
        assert_eq!(during.messages.last().unwrap().sender, Sender::User);

        panel.wait_idle().await;
        let after = panel.snapshot().unwrap();
        assert_eq!(after.messages.len(), initial + 2);
        let last = after.messages.last().unwrap();
        assert_eq!(last.text, "Hi!");
        assert_eq!(last.status, MessageStatus::Success);
        assert!(!after.typing);
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            backend.last_question.lock().unwrap().as_deref(),
            Some("hello")
        );
    }

    #[tokio::test]
    async fn test_blank_input_issues_no_call() {
        let (panel, backend) = panel_with(FakeBackend::replying("Hi!", None));
        let initial = panel.snapshot().unwrap().messages.len();

        assert_eq!(panel.send("").unwrap(), None);
        assert_eq!(panel.send("   ").unwrap(), None);
        panel.wait_idle().await;

        assert_eq!(panel.snapshot().unwrap().messages.len(), initial);
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_appends_error_bubble() {
        let (panel, _) = panel_with(FakeBackend::failing(ApiError::status(500, "boom")));
        panel.send("hello").unwrap();
        panel.wait_idle().await;

        let snapshot = panel.snapshot().unwrap();
        assert_eq!(snapshot.messages.len(), 4);
        let last = snapshot.messages.last().unwrap();
        assert_eq!(last.status, MessageStatus::Error);
        assert_eq!(last.text, prompts::ERROR_FALLBACK);
    }

    #[tokio::test]
    async fn test_close_aborts_without_message() {
        let gate = Arc::new(Semaphore::new(0));
        let (panel, backend) =
            panel_with(FakeBackend::replying("too late", None).gated(gate.clone()));
        panel.open().unwrap();

        panel.send("hello").unwrap();
        wait_for_calls(&backend, 1).await;
        panel.close().unwrap();
        gate.add_permits(1);
        panel.wait_idle().await;
        tokio::task::yield_now().await;

        let snapshot = panel.snapshot().unwrap();
        assert!(!snapshot.open);
        assert!(!snapshot.typing);
        assert_eq!(snapshot.messages.len(), 3);
        assert_eq!(snapshot.messages.last().unwrap().sender, Sender::User);
    }

    #[tokio::test]
    async fn test_send_with_poisoned_registry_changes_nothing() {
        let (panel, backend) = panel_with(FakeBackend::replying("Hi!", None));
        panel
            .select_file(FileAttachment::new("lease.pdf", vec![1]))
            .unwrap();
        let initial = panel.snapshot().unwrap().messages.len();

        let poisoner = panel.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.registry.lock().unwrap();
            panic!("poison registry");
        })
        .join();

        assert!(panel.send("hello").is_err());
        tokio::time::timeout(std::time::Duration::from_secs(1), panel.wait_idle())
            .await
            .expect("panel should stay idle");

        let snapshot = panel.snapshot().unwrap();
        assert_eq!(snapshot.messages.len(), initial);
        assert!(!snapshot.typing);
        assert!(snapshot.selected_file.is_some());
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_new_send_supersedes_previous() {
        let gate = Arc::new(Semaphore::new(0));
        let (panel, backend) = panel_with(FakeBackend::replying("answer", None).gated(gate.clone()));

        let first = panel.send("first").unwrap().unwrap();
        wait_for_calls(&backend, 1).await;
        let second = panel.send("second").unwrap().unwrap();
        assert_ne!(first, second);
        wait_for_calls(&backend, 2).await;

        gate.add_permits(2);
        panel.wait_idle().await;
        tokio::task::yield_now().await;

        let snapshot = panel.snapshot().unwrap();
        // two welcome + two user bubbles + one reply
        assert_eq!(snapshot.messages.len(), 5);
        let replies = snapshot
            .messages
            .iter()
            .filter(|m| m.status == MessageStatus::Success)
            .count();
        assert_eq!(replies, 1);
    }

    #[tokio::test]
    async fn test_selected_file_goes_to_doc_chat() {
        let (panel, backend) = panel_with(FakeBackend::replying("Reviewed", None));
        panel
            .select_file(FileAttachment::new("lease.pdf", vec![7; 10]))
            .unwrap();
        assert!(panel.snapshot().unwrap().selected_file.is_some());

        panel.send("").unwrap().unwrap();
        assert!(panel.snapshot().unwrap().selected_file.is_none());
        panel.wait_idle().await;

        assert_eq!(backend.doc_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
        let snapshot = panel.snapshot().unwrap();
        let user = &snapshot.messages[2];
        assert_eq!(user.text, "Analyzing document: lease.pdf");
        assert_eq!(user.file.as_ref().unwrap().name, "lease.pdf");
    }

    #[tokio::test]
    async fn test_reasoning_is_kept_and_toggled() {
        let (panel, _) = panel_with(FakeBackend::replying("Yes.", Some("Because the lease says so.")));
        panel.send("Can I sublet?").unwrap();
        panel.wait_idle().await;

        let reply = panel.snapshot().unwrap().messages.last().unwrap().clone();
        assert_eq!(reply.reasoning.as_deref(), Some("Because the lease says so."));
        assert!(!reply.show_reasoning);

        assert_eq!(panel.toggle_reasoning(&reply.id).unwrap(), Some(true));
        assert_eq!(panel.toggle_reasoning(&reply.id).unwrap(), Some(false));
        assert_eq!(panel.toggle_reasoning("missing").unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_conversation() {
        let (panel, _) = panel_with(FakeBackend::replying("Hi!", None));
        panel.send("hello").unwrap();
        panel.wait_idle().await;
        panel
            .select_file(FileAttachment::new("a.txt", vec![1]))
            .unwrap();

        panel.clear_conversation().unwrap();
        let snapshot = panel.snapshot().unwrap();
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].text, prompts::FRESH_GREETING);
        assert!(snapshot.selected_file.is_none());
    }

    #[tokio::test]
    async fn test_events_follow_send() {
        let (panel, _) = panel_with(FakeBackend::replying("Hi!", None));
        let mut events = panel.subscribe();

        panel.send("hello").unwrap();
        panel.wait_idle().await;

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(event);
        }
        assert!(matches!(kinds[0], PanelEvent::MessageAppended { .. }));
        assert!(matches!(kinds[1], PanelEvent::TypingChanged { typing: true }));
        assert!(kinds.iter().any(
            |e| matches!(e, PanelEvent::MessageAppended { message } if message.text == "Hi!")
        ));
        assert!(matches!(
            kinds.last(),
            Some(PanelEvent::TypingChanged { typing: false })
        ));
    }

    #[tokio::test]
    async fn test_suggestion_out_of_range() {
        let (panel, backend) = panel_with(FakeBackend::replying("ok", None));
        assert!(panel.send_suggestion(99).is_err());
        panel.send_suggestion(0).unwrap().unwrap();
        panel.wait_idle().await;
        assert_eq!(
            backend.last_question.lock().unwrap().as_deref(),
            Some(prompts::SUGGESTED_PROMPTS[0])
        );
    }
}
