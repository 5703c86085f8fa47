//! The CampusBot HTTP contract.
//!
//! Controllers talk to the backend only through [`CampusApi`], so the
//! transport can be swapped (the real [`HttpApi`] or a scripted fake in
//! tests) without touching screen logic.

pub mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::state::{ExtraData, SessionUser};

pub use http::HttpApi;

pub const CSRF_PATH: &str = "/api/csrf/";
pub const USER_INFO_PATH: &str = "/api/user-info/";
pub const CHATBOT_PATH: &str = "/api/chatbot/";
pub const LOGOUT_PATH: &str = "/logout/";
pub const LOGIN_PATH: &str = "/login/";
pub const SEND_VERIFICATION_PATH: &str = "/send-verification-email/";
pub const VERIFY_CODE_PATH: &str = "/verify-code/";
pub const PASSWORD_RESET_PATH: &str = "/password-reset/";

/// Shared handle used by every controller.
pub type SharedApi = Arc<dyn CampusApi>;

/// Outcome of a form post whose success is signalled by a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormResponse {
    /// The server redirected; `path` is the target path without host.
    Redirect { path: String },
    /// The server answered with a page instead of redirecting.
    Page { status: u16, body: String },
}

/// Body of a successful `/api/chatbot/` answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_extra_data")]
    pub extra_data: Option<ExtraData>,
}

/// Keep the entries worth rendering: strings as-is, numbers and `true`
/// stringified; nulls, empty strings, `false` and nested values dropped.
fn deserialize_extra_data<'de, D>(deserializer: D) -> std::result::Result<Option<ExtraData>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Map<String, Value>>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let data: ExtraData = raw
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) if !s.is_empty() => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(true) => "true".to_string(),
                _ => return None,
            };
            Some((key, text))
        })
        .collect();

    Ok(if data.is_empty() { None } else { Some(data) })
}

#[async_trait]
pub trait CampusApi: Send + Sync {
    /// `GET /api/csrf/`, which makes the server set the CSRF cookie.
    async fn fetch_csrf(&self) -> Result<()>;

    /// `GET /api/user-info/`. Succeeds only on 200.
    async fn user_info(&self) -> Result<SessionUser>;

    /// `POST /api/chatbot/` with `{question}`.
    async fn ask(&self, question: &str) -> Result<ChatReply>;

    /// `POST /logout/`.
    async fn logout(&self) -> Result<()>;

    /// `POST /login/` with `email` and `password`.
    async fn login(&self, email: &str, password: &str) -> Result<FormResponse>;

    /// `POST /send-verification-email/` with `email`.
    async fn send_verification_email(&self, email: &str) -> Result<()>;

    /// `POST /verify-code/` with `email` and `code`.
    async fn verify_code(&self, email: &str, code: &str) -> Result<()>;

    /// `POST /password-reset/` with both passwords and the verification code.
    async fn reset_password(
        &self,
        new_password: &str,
        confirm_password: &str,
        verification_code: &str,
    ) -> Result<FormResponse>;
}
