//! Scripted `CampusApi` for controller tests.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{CampusApi, ChatReply, FormResponse};
use crate::error::{ApiError, Result};
use crate::state::SessionUser;

#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    Status(u16),
    /// Body that fails to decode
    Broken,
    /// The transport itself blows up
    Panic,
    /// Never resolves
    Hang,
}

async fn resolve<T>(reply: Reply<T>) -> Result<T> {
    match reply {
        Reply::Ok(value) => Ok(value),
        Reply::Status(code) => Err(ApiError::Status(code)),
        Reply::Broken => Err(serde_json::from_str::<serde_json::Value>("{").unwrap_err().into()),
        Reply::Panic => panic!("fake transport panicked"),
        Reply::Hang => std::future::pending().await,
    }
}

pub(crate) struct FakeApi {
    calls: Mutex<Vec<String>>,
    pub csrf: Mutex<Reply<()>>,
    pub user_info: Mutex<Reply<SessionUser>>,
    pub ask: Mutex<Reply<ChatReply>>,
    pub logout: Mutex<Reply<()>>,
    pub login: Mutex<Reply<FormResponse>>,
    pub send_verification: Mutex<Reply<()>>,
    pub verify: Mutex<Reply<()>>,
    pub reset: Mutex<Reply<FormResponse>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            csrf: Mutex::new(Reply::Ok(())),
            user_info: Mutex::new(Reply::Status(401)),
            ask: Mutex::new(Reply::Ok(ChatReply::default())),
            logout: Mutex::new(Reply::Ok(())),
            login: Mutex::new(Reply::Status(500)),
            send_verification: Mutex::new(Reply::Ok(())),
            verify: Mutex::new(Reply::Ok(())),
            reset: Mutex::new(Reply::Status(500)),
        }
    }
}

impl FakeApi {
    pub fn set<T>(slot: &Mutex<Reply<T>>, reply: Reply<T>) {
        *slot.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CampusApi for FakeApi {
    async fn fetch_csrf(&self) -> Result<()> {
        self.record("csrf".to_string());
        let reply = self.csrf.lock().unwrap().clone();
        resolve(reply).await
    }

    async fn user_info(&self) -> Result<SessionUser> {
        self.record("user_info".to_string());
        let reply = self.user_info.lock().unwrap().clone();
        resolve(reply).await
    }

    async fn ask(&self, question: &str) -> Result<ChatReply> {
        self.record(format!("ask {question}"));
        let reply = self.ask.lock().unwrap().clone();
        resolve(reply).await
    }

    async fn logout(&self) -> Result<()> {
        self.record("logout".to_string());
        let reply = self.logout.lock().unwrap().clone();
        resolve(reply).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<FormResponse> {
        self.record(format!("login {email} {password}"));
        let reply = self.login.lock().unwrap().clone();
        resolve(reply).await
    }

    async fn send_verification_email(&self, email: &str) -> Result<()> {
        self.record(format!("send_verification {email}"));
        let reply = self.send_verification.lock().unwrap().clone();
        resolve(reply).await
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<()> {
        self.record(format!("verify {email} {code}"));
        let reply = self.verify.lock().unwrap().clone();
        resolve(reply).await
    }

    async fn reset_password(
        &self,
        new_password: &str,
        confirm_password: &str,
        verification_code: &str,
    ) -> Result<FormResponse> {
        self.record(format!("reset {new_password} {confirm_password} {verification_code}"));
        let reply = self.reset.lock().unwrap().clone();
        resolve(reply).await
    }
}
