//! Message list and in-flight bookkeeping for one assistant panel.
//!
//! Pure state: no I/O happens here. `ChatPanel` drives the network side and
//! feeds outcomes back through [`Conversation::resolve`].

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::services::api::{ApiError, ChatReply, FileAttachment};
use crate::services::prompts;

use super::types::{
    FileDescriptor, Message, MessageStatus, OutboundRequest, PendingRequest, Sender,
};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::now_v7())
}

#[derive(Debug)]
pub struct Conversation {
    messages: Vec<Message>,
    next_seq: u64,
    typing: bool,
    /// Request the typing indicator belongs to.
    latest_request: Option<String>,
    pending: Vec<PendingRequest>,
    selected_file: Option<FileAttachment>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        let mut conversation = Self {
            messages: Vec::new(),
            next_seq: 0,
            typing: false,
            latest_request: None,
            pending: Vec::new(),
            selected_file: None,
        };
        conversation.push_assistant(
            "welcome-1".to_string(),
            prompts::WELCOME_TITLE,
            MessageStatus::Initial,
            None,
        );
        conversation.push_assistant(
            "welcome-2".to_string(),
            prompts::WELCOME_INTRO,
            MessageStatus::Initial,
            None,
        );
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn selected_file(&self) -> Option<&FileAttachment> {
        self.selected_file.as_ref()
    }

    pub fn select_file(&mut self, file: FileAttachment) {
        self.selected_file = Some(file);
    }

    pub fn remove_file(&mut self) -> Option<FileAttachment> {
        self.selected_file.take()
    }

    /// Suggested prompts are offered only on a fresh, idle panel.
    pub fn show_suggestions(&self) -> bool {
        self.messages.len() <= 2 && !self.typing
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn push_assistant(
        &mut self,
        id: String,
        text: &str,
        status: MessageStatus,
        reasoning: Option<String>,
    ) -> &Message {
        let seq = self.next_seq();
        self.messages.push(Message {
            id,
            seq,
            text: text.to_string(),
            file: None,
            sender: Sender::Assistant,
            created_at_ms: now_ms(),
            status,
            reasoning,
            show_reasoning: false,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Append the user bubble and describe the call to make.
    ///
    /// Returns `None` (and changes nothing) when the text is blank and no
    /// file is attached.
    pub fn submit(&mut self, text: &str, file: Option<FileAttachment>) -> Option<OutboundRequest> {
        let question = text.trim();
        if question.is_empty() && file.is_none() {
            return None;
        }

        let body = match (&file, question.is_empty()) {
            (Some(file), true) => prompts::analyzing_document(&file.name),
            _ => question.to_string(),
        };

        let message_id = new_id("msg");
        let seq = self.next_seq();
        self.messages.push(Message {
            id: message_id.clone(),
            seq,
            text: body,
            file: file.as_ref().map(FileDescriptor::from),
            sender: Sender::User,
            created_at_ms: now_ms(),
            status: MessageStatus::Initial,
            reasoning: None,
            show_reasoning: false,
        });

        let request_id = new_id("req");
        self.pending.push(PendingRequest {
            request_id: request_id.clone(),
            message_id: message_id.clone(),
        });
        self.latest_request = Some(request_id.clone());
        self.typing = true;

        Some(OutboundRequest {
            request_id,
            message_id,
            question: question.to_string(),
            file,
        })
    }

    fn settle(&mut self, request_id: &str) -> Option<PendingRequest> {
        let index = self.pending.iter().position(|p| p.request_id == request_id)?;
        let pending = self.pending.remove(index);
        if self.latest_request.as_deref() == Some(request_id) {
            self.latest_request = None;
            self.typing = false;
        }
        Some(pending)
    }

    /// Apply the outcome of a call.
    ///
    /// Unknown or already-settled request ids are dropped, as are
    /// cancellations. Returns the appended assistant bubble, if any.
    pub fn resolve(
        &mut self,
        request_id: &str,
        outcome: Result<ChatReply, ApiError>,
    ) -> Option<&Message> {
        let Some(pending) = self.settle(request_id) else {
            log::debug!("Dropping outcome for settled request {}", request_id);
            return None;
        };

        match outcome {
            Ok(reply) => Some(self.push_assistant(
                format!("response_{}", pending.message_id),
                &reply.answer,
                MessageStatus::Success,
                Some(reply.think.unwrap_or_default()),
            )),
            Err(err) if err.is_aborted() => {
                log::debug!("Request {} aborted", request_id);
                None
            }
            Err(err) => {
                log::error!("Chat error: {}", err);
                Some(self.push_assistant(
                    format!("error_{}", pending.message_id),
                    prompts::ERROR_FALLBACK,
                    MessageStatus::Error,
                    None,
                ))
            }
        }
    }

    /// Forget an in-flight request without appending anything.
    pub fn cancel(&mut self, request_id: &str) -> bool {
        self.settle(request_id).is_some()
    }

    /// Replace the whole list with a single fresh greeting.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.selected_file = None;
        self.push_assistant(
            "welcome-new".to_string(),
            prompts::FRESH_GREETING,
            MessageStatus::Initial,
            None,
        );
    }

    /// Flip the reasoning flag of one message. Returns the new flag, or
    /// `None` when no message has that id.
    pub fn toggle_reasoning(&mut self, message_id: &str) -> Option<bool> {
        let message = self.messages.iter_mut().find(|m| m.id == message_id)?;
        message.show_reasoning = !message.show_reasoning;
        Some(message.show_reasoning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(answer: &str, think: Option<&str>) -> ChatReply {
        ChatReply {
            answer: answer.to_string(),
            think: think.map(str::to_string),
        }
    }

    #[test]
    fn test_starts_with_two_welcome_messages() {
        let conv = Conversation::new();
        assert_eq!(conv.messages().len(), 2);
        assert!(conv.messages().iter().all(|m| m.sender == Sender::Assistant));
        assert!(conv.messages().iter().all(|m| m.status == MessageStatus::Initial));
        assert!(conv.show_suggestions());
    }

    #[test]
    fn test_blank_submission_is_ignored() {
        let mut conv = Conversation::new();
        assert!(conv.submit("", None).is_none());
        assert!(conv.submit("   \n\t", None).is_none());
        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.pending_count(), 0);
        assert!(!conv.is_typing());
    }

    #[test]
    fn test_submit_appends_user_message_before_reply() {
        let mut conv = Conversation::new();
        let request = conv.submit("  hello ", None).unwrap();

        assert_eq!(request.question, "hello");
        assert!(request.file.is_none());
        assert_eq!(conv.messages().len(), 3);
        let user = conv.last_message().unwrap();
        assert_eq!(user.sender, Sender::User);
        assert_eq!(user.status, MessageStatus::Initial);
        assert_eq!(user.text, "hello");
        assert_eq!(user.id, request.message_id);
        assert!(conv.is_typing());
        assert!(!conv.show_suggestions());
    }

    #[test]
    fn test_success_appends_one_assistant_message() {
        let mut conv = Conversation::new();
        let request = conv.submit("hello", None).unwrap();

        let appended = conv.resolve(&request.request_id, Ok(reply("Hi!", None))).unwrap();
        assert_eq!(appended.text, "Hi!");
        assert_eq!(appended.status, MessageStatus::Success);
        assert_eq!(appended.reasoning.as_deref(), Some(""));
        assert!(!appended.show_reasoning);

        assert_eq!(conv.messages().len(), 4);
        assert_eq!(conv.last_message().unwrap().text, "Hi!");
        assert!(!conv.is_typing());
    }

    #[test]
    fn test_failure_appends_fallback() {
        let mut conv = Conversation::new();
        let request = conv.submit("hello", None).unwrap();

        let appended = conv
            .resolve(&request.request_id, Err(ApiError::status(500, "boom")))
            .unwrap();
        assert_eq!(appended.status, MessageStatus::Error);
        assert_eq!(appended.text, prompts::ERROR_FALLBACK);
        assert_eq!(conv.messages().len(), 4);
    }

    #[test]
    fn test_failure_body_ignores_error_detail() {
        let mut conv = Conversation::new();
        let a = conv.submit("a", None).unwrap();
        conv.resolve(&a.request_id, Err(ApiError::network("connection refused")));
        let b = conv.submit("b", None).unwrap();
        conv.resolve(&b.request_id, Err(ApiError::malformed("missing answer")));

        let errors: Vec<_> = conv
            .messages()
            .iter()
            .filter(|m| m.status == MessageStatus::Error)
            .collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].text, errors[1].text);
    }

    #[test]
    fn test_abort_appends_nothing() {
        let mut conv = Conversation::new();
        let request = conv.submit("hello", None).unwrap();

        assert!(conv.resolve(&request.request_id, Err(ApiError::aborted("closed"))).is_none());
        assert_eq!(conv.messages().len(), 3);
        assert!(!conv.is_typing());
    }

    #[test]
    fn test_cancelled_request_outcome_is_dropped() {
        let mut conv = Conversation::new();
        let request = conv.submit("hello", None).unwrap();
        assert!(conv.cancel(&request.request_id));
        assert!(!conv.cancel(&request.request_id));

        assert!(conv.resolve(&request.request_id, Ok(reply("late", None))).is_none());
        assert_eq!(conv.messages().len(), 3);
    }

    #[test]
    fn test_outcome_applies_once() {
        let mut conv = Conversation::new();
        let request = conv.submit("hello", None).unwrap();
        conv.resolve(&request.request_id, Ok(reply("first", None)));
        assert!(conv.resolve(&request.request_id, Err(ApiError::network("x"))).is_none());
        assert_eq!(conv.last_message().unwrap().status, MessageStatus::Success);
    }

    #[test]
    fn test_typing_follows_latest_request() {
        let mut conv = Conversation::new();
        let first = conv.submit("first", None).unwrap();
        let second = conv.submit("second", None).unwrap();

        conv.resolve(&first.request_id, Ok(reply("one", None)));
        assert!(conv.is_typing());
        conv.resolve(&second.request_id, Ok(reply("two", None)));
        assert!(!conv.is_typing());
    }

    #[test]
    fn test_file_only_submission() {
        let mut conv = Conversation::new();
        let file = FileAttachment::new("lease.pdf", vec![0; 2048]);
        let request = conv.submit("", Some(file)).unwrap();

        assert_eq!(request.question, "");
        assert!(request.file.is_some());
        let user = conv.last_message().unwrap();
        assert_eq!(user.text, "Analyzing document: lease.pdf");
        let descriptor = user.file.as_ref().unwrap();
        assert_eq!(descriptor.size, 2048);
        assert_eq!(descriptor.mime_type, "application/pdf");
    }

    #[test]
    fn test_ids_follow_creation_order() {
        let mut conv = Conversation::new();
        conv.submit("a", None);
        conv.submit("b", None);
        let seqs: Vec<u64> = conv.messages().iter().map(|m| m.seq).collect();
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        let ids: std::collections::HashSet<_> = conv.messages().iter().map(|m| &m.id).collect();
        assert_eq!(ids.len(), conv.messages().len());
    }

    #[test]
    fn test_clear_leaves_single_greeting() {
        let mut conv = Conversation::new();
        conv.select_file(FileAttachment::new("a.txt", vec![1]));
        let request = conv.submit("hello", None).unwrap();
        conv.resolve(&request.request_id, Ok(reply("Hi!", None)));

        conv.clear();
        assert_eq!(conv.messages().len(), 1);
        assert_eq!(conv.messages()[0].text, prompts::FRESH_GREETING);
        assert!(conv.selected_file().is_none());

        conv.clear();
        assert_eq!(conv.messages().len(), 1);
    }

    #[test]
    fn test_toggle_reasoning() {
        let mut conv = Conversation::new();
        let request = conv.submit("why?", None).unwrap();
        let id = conv
            .resolve(&request.request_id, Ok(reply("Because.", Some("step 1"))))
            .unwrap()
            .id
            .clone();

        assert_eq!(conv.toggle_reasoning(&id), Some(true));
        assert_eq!(conv.toggle_reasoning(&id), Some(false));
        assert!(!conv.last_message().unwrap().show_reasoning);

        let before = conv.messages().to_vec();
        assert_eq!(conv.toggle_reasoning("no-such-id"), None);
        assert_eq!(conv.messages(), before.as_slice());
    }
}
