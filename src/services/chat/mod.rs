//! Conversational assistant panel.
//!
//! `Conversation` is the pure message-list state machine; `ChatPanel` wires
//! it to a [`ChatBackend`](crate::services::api::ChatBackend) and owns the
//! abort handles of in-flight calls.

mod conversation;
mod manager;
mod panel;
mod types;

pub use conversation::Conversation;
pub use panel::{ChatPanel, PanelSnapshot};
pub use types::{
    FileDescriptor, Message, MessageStatus, OutboundRequest, PanelEvent, PendingRequest, Sender,
};
