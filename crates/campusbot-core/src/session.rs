//! Chat Session Controller
//!
//! Owns everything the chat screen shows: message history, the composer,
//! the loading flag and the logged-in user. All network traffic for the
//! screen goes through here.
//!
//! A session lives exactly as long as the chat screen. Requests still in
//! flight when it is closed or dropped are aborted, so their results never
//! reach another screen.

use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::api::{ChatReply, SharedApi};
use crate::error::Result;
use crate::route::Route;
use crate::state::{ChatMessage, Composer, SessionUser};
use crate::task::Pending;

/// Shown when the backend answered without an `answer` field.
pub const NO_ANSWER: &str = "Sorry, no answer.";

/// Shown for any failed chat round trip.
pub const CHATBOT_ERROR: &str = "Error contacting chatbot API.";

pub struct ChatSession {
    api: SharedApi,
    messages: Vec<ChatMessage>,
    composer: Composer,
    user: Option<SessionUser>,
    user_lookup: Option<Pending<Option<SessionUser>>>,
    reply: Option<Pending<Result<ChatReply>>>,
    logout: Option<Pending<Result<()>>>,
}

impl ChatSession {
    /// Enter the chat screen and start looking up the current user.
    pub fn open(api: SharedApi) -> Self {
        let lookup_api = api.clone();
        let user_lookup = Pending::spawn(async move {
            match lookup_api.user_info().await {
                Ok(user) => Some(user),
                Err(e) => {
                    // Not being logged in is an expected state
                    debug!(error = %e, "no active session");
                    None
                }
            }
        });

        Self {
            api,
            messages: Vec::new(),
            composer: Composer::default(),
            user: None,
            user_lookup: Some(user_lookup),
            reply: None,
            logout: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.composer.in_flight
    }

    pub fn is_logging_out(&self) -> bool {
        self.logout.is_some()
    }

    pub fn draft(&self) -> &str {
        &self.composer.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.composer.draft = text.into();
    }

    /// Send whatever is in the composer.
    pub fn submit(&mut self) -> bool {
        let text = self.composer.draft.clone();
        self.submit_message(&text)
    }

    /// Append `text` as a user message and ask the chatbot about it.
    ///
    /// Blank input and submissions while a reply is outstanding are ignored.
    /// Returns whether a request was issued. The bot message is appended
    /// later, by [`poll`](Self::poll) or [`settle`](Self::settle).
    pub fn submit_message(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.composer.in_flight {
            return false;
        }

        self.messages.push(ChatMessage::user(text));
        self.composer.draft.clear();
        self.composer.in_flight = true;

        let api = self.api.clone();
        let question = text.to_string();
        self.reply = Some(Pending::spawn(async move { api.ask(&question).await }));
        true
    }

    /// Start logging out. Ignored while a logout is already pending.
    pub fn logout(&mut self) {
        if self.logout.is_some() {
            return;
        }
        let api = self.api.clone();
        self.logout = Some(Pending::spawn(async move { api.logout().await }));
    }

    /// Clear the history and drop any reply still on its way.
    pub fn new_chat(&mut self) {
        self.reply = None;
        self.composer.in_flight = false;
        self.messages.clear();
    }

    /// Abort everything still running. The session stays usable.
    pub fn close(&mut self) {
        self.user_lookup = None;
        self.reply = None;
        self.logout = None;
        self.composer.in_flight = false;
    }

    /// Apply whichever requests have finished, without waiting.
    ///
    /// Returns the route to navigate to once a logout went through; the
    /// caller is expected to throw the whole session away at that point.
    pub fn poll(&mut self) -> Option<Route> {
        if let Some(outcome) = self.user_lookup.as_mut().and_then(|p| p.poll()) {
            self.user_lookup = None;
            self.apply_user(outcome);
        }

        if let Some(outcome) = self.reply.as_mut().and_then(|p| p.poll()) {
            self.reply = None;
            self.apply_reply(outcome);
        }

        if let Some(outcome) = self.logout.as_mut().and_then(|p| p.poll()) {
            self.logout = None;
            return self.apply_logout(outcome);
        }

        None
    }

    /// Wait for every outstanding request and apply the results.
    pub async fn settle(&mut self) -> Option<Route> {
        if let Some(pending) = self.user_lookup.take() {
            let outcome = pending.join().await;
            self.apply_user(outcome);
        }

        if let Some(pending) = self.reply.take() {
            let outcome = pending.join().await;
            self.apply_reply(outcome);
        }

        match self.logout.take() {
            Some(pending) => {
                let outcome = pending.join().await;
                self.apply_logout(outcome)
            }
            None => None,
        }
    }

    fn apply_user(&mut self, outcome: std::result::Result<Option<SessionUser>, JoinError>) {
        self.user = outcome.ok().flatten();
        if let Some(user) = &self.user {
            info!(username = %user.username, "session active");
        }
    }

    fn apply_reply(&mut self, outcome: std::result::Result<Result<ChatReply>, JoinError>) {
        let message = match outcome {
            Ok(Ok(reply)) => {
                let text = reply
                    .answer
                    .filter(|answer| !answer.is_empty())
                    .unwrap_or_else(|| NO_ANSWER.to_string());
                ChatMessage::bot(text, reply.extra_data)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "chatbot request failed");
                ChatMessage::bot(CHATBOT_ERROR, None)
            }
            Err(e) => {
                warn!(error = %e, "chatbot request did not complete");
                ChatMessage::bot(CHATBOT_ERROR, None)
            }
        };

        self.messages.push(message);
        self.composer.in_flight = false;
    }

    fn apply_logout(&mut self, outcome: std::result::Result<Result<()>, JoinError>) -> Option<Route> {
        match outcome {
            Ok(Ok(())) => {
                info!("logged out");
                Some(Route::Landing)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "logout failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "logout did not complete");
                None
            }
        }
    }
}
