//! UI-agnostic chat state types
//!
//! These are shared by every front end and don't depend on any UI framework.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Side information attached to a bot answer, rendered as a key/value list.
pub type ExtraData = BTreeMap<String, String>;

/// A message in the chat history. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<ExtraData>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            extra_data: None,
        }
    }

    pub fn bot(text: impl Into<String>, extra_data: Option<ExtraData>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            extra_data,
        }
    }
}

/// Who sent a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// The logged-in user as reported by `/api/user-info/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
}

/// Draft text plus the in-flight flag for the chat input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    pub draft: String,
    pub in_flight: bool,
}
