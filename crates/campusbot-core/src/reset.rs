//! Password Reset Form Controller
//!
//! Two phases: the user first proves control of their email with a code the
//! server mails out, then picks a new password. The email address must be
//! supplied by the caller; this module never tries to work it out.

use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::api::{FormResponse, SharedApi};
use crate::error::{ApiError, Result};
use crate::route::Route;
use crate::task::Pending;

pub const SEND_FAILED: &str = "Failed to send verification code.";
pub const SEND_ERROR: &str = "Error sending verification code.";
pub const MISSING_CODE: &str = "Please enter the verification code.";
pub const VERIFIED: &str = "Verification successful. You can now reset your password.";
pub const INVALID_CODE: &str = "Invalid verification code.";
pub const VERIFY_ERROR: &str = "An error occurred during verification.";
pub const MISSING_FIELDS: &str = "Please fill out all fields.";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub const NOT_VERIFIED: &str = "Please verify your email first.";
pub const RESET_FAILED: &str = "Password reset failed. Please try again.";
pub const RESET_ERROR: &str = "An error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPhase {
    AwaitingVerification,
    Verified,
}

pub struct PasswordReset {
    api: SharedApi,
    email: String,
    phase: ResetPhase,
    pub code: String,
    pub new_password: String,
    pub confirm_password: String,
    verification_sent: bool,
    error: Option<String>,
    success: Option<String>,
    sending: Option<Pending<Result<()>>>,
    verifying: Option<Pending<Result<()>>>,
    resetting: Option<Pending<Result<FormResponse>>>,
}

impl PasswordReset {
    /// Enter the reset screen and ask the server to mail a code to `email`.
    pub fn open(api: SharedApi, email: impl Into<String>) -> Self {
        let email = email.into();

        let send_api = api.clone();
        let send_to = email.clone();
        let sending = Pending::spawn(async move { send_api.send_verification_email(&send_to).await });

        Self {
            api,
            email,
            phase: ResetPhase::AwaitingVerification,
            code: String::new(),
            new_password: String::new(),
            confirm_password: String::new(),
            verification_sent: false,
            error: None,
            success: None,
            sending: Some(sending),
            verifying: None,
            resetting: None,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phase(&self) -> ResetPhase {
        self.phase
    }

    pub fn verification_sent(&self) -> bool {
        self.verification_sent
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.verifying.is_some() || self.resetting.is_some()
    }

    fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
    }

    /// Post the entered code. Does nothing until the code has been sent.
    pub fn verify(&mut self) -> bool {
        if !self.verification_sent || self.phase == ResetPhase::Verified || self.is_busy() {
            return false;
        }
        self.clear_messages();

        if self.code.is_empty() {
            self.error = Some(MISSING_CODE.to_string());
            return false;
        }

        let api = self.api.clone();
        let email = self.email.clone();
        let code = self.code.clone();
        self.verifying = Some(Pending::spawn(async move { api.verify_code(&email, &code).await }));
        true
    }

    /// Post the new password. Validation failures never reach the server.
    pub fn submit(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.clear_messages();

        if self.new_password.is_empty() || self.confirm_password.is_empty() {
            self.error = Some(MISSING_FIELDS.to_string());
            return false;
        }
        if self.new_password != self.confirm_password {
            self.error = Some(PASSWORD_MISMATCH.to_string());
            return false;
        }
        if self.phase != ResetPhase::Verified {
            self.error = Some(NOT_VERIFIED.to_string());
            return false;
        }

        let api = self.api.clone();
        let new_password = self.new_password.clone();
        let confirm_password = self.confirm_password.clone();
        let code = self.code.clone();
        self.resetting = Some(Pending::spawn(async move {
            api.reset_password(&new_password, &confirm_password, &code).await
        }));
        true
    }

    /// Apply finished requests; returns a route once the reset went through.
    pub fn poll(&mut self) -> Option<Route> {
        if let Some(outcome) = self.sending.as_mut().and_then(|p| p.poll()) {
            self.sending = None;
            self.apply_sent(outcome);
        }

        if let Some(outcome) = self.verifying.as_mut().and_then(|p| p.poll()) {
            self.verifying = None;
            self.apply_verified(outcome);
        }

        let outcome = self.resetting.as_mut().and_then(|p| p.poll())?;
        self.resetting = None;
        self.apply_reset(outcome)
    }

    /// Wait for every outstanding request and apply the results.
    pub async fn settle(&mut self) -> Option<Route> {
        if let Some(pending) = self.sending.take() {
            let outcome = pending.join().await;
            self.apply_sent(outcome);
        }

        if let Some(pending) = self.verifying.take() {
            let outcome = pending.join().await;
            self.apply_verified(outcome);
        }

        let pending = self.resetting.take()?;
        let outcome = pending.join().await;
        self.apply_reset(outcome)
    }

    fn apply_sent(&mut self, outcome: std::result::Result<Result<()>, JoinError>) {
        match outcome {
            Ok(Ok(())) => {
                debug!(email = %self.email, "verification code sent");
                self.verification_sent = true;
            }
            Ok(Err(ApiError::Status(status))) => {
                warn!(status, "server refused to send verification code");
                self.error = Some(SEND_FAILED.to_string());
            }
            Ok(Err(e)) => {
                warn!(error = %e, "sending verification code failed");
                self.error = Some(SEND_ERROR.to_string());
            }
            Err(e) => {
                warn!(error = %e, "sending verification code did not complete");
                self.error = Some(SEND_ERROR.to_string());
            }
        }
    }

    fn apply_verified(&mut self, outcome: std::result::Result<Result<()>, JoinError>) {
        match outcome {
            Ok(Ok(())) => {
                info!("verification code accepted");
                self.phase = ResetPhase::Verified;
                self.success = Some(VERIFIED.to_string());
            }
            Ok(Err(ApiError::Status(status))) => {
                debug!(status, "verification code rejected");
                self.error = Some(INVALID_CODE.to_string());
            }
            Ok(Err(e)) => {
                warn!(error = %e, "verification request failed");
                self.error = Some(VERIFY_ERROR.to_string());
            }
            Err(e) => {
                warn!(error = %e, "verification request did not complete");
                self.error = Some(VERIFY_ERROR.to_string());
            }
        }
    }

    fn apply_reset(&mut self, outcome: std::result::Result<Result<FormResponse>, JoinError>) -> Option<Route> {
        match outcome {
            Ok(Ok(FormResponse::Redirect { path })) => {
                info!(target = %path, "password reset");
                Some(Route::Chatbot)
            }
            Ok(Ok(FormResponse::Page { status, .. })) => {
                debug!(status, "password reset rejected");
                self.error = Some(RESET_FAILED.to_string());
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "password reset request failed");
                self.error = Some(RESET_ERROR.to_string());
                None
            }
            Err(e) => {
                warn!(error = %e, "password reset request did not complete");
                self.error = Some(RESET_ERROR.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeApi, Reply};
    use std::sync::Arc;

    const EMAIL: &str = "student@campus.edu";

    async fn opened(fake: &Arc<FakeApi>) -> PasswordReset {
        let api: SharedApi = fake.clone();
        let mut reset = PasswordReset::open(api, EMAIL);
        reset.settle().await;
        reset
    }

    async fn verified(fake: &Arc<FakeApi>) -> PasswordReset {
        let mut reset = opened(fake).await;
        reset.code = "123456".to_string();
        assert!(reset.verify());
        reset.settle().await;
        assert_eq!(reset.phase(), ResetPhase::Verified);
        reset
    }

    #[tokio::test]
    async fn test_open_sends_code() {
        let fake = Arc::new(FakeApi::default());
        let reset = opened(&fake).await;

        assert!(reset.verification_sent());
        assert_eq!(reset.phase(), ResetPhase::AwaitingVerification);
        assert_eq!(reset.error(), None);
        assert_eq!(fake.calls(), vec![format!("send_verification {EMAIL}")]);
    }

    #[tokio::test]
    async fn test_send_failures() {
        let cases = [(Reply::Status(500), SEND_FAILED), (Reply::Panic, SEND_ERROR)];
        for (reply, message) in cases {
            let fake = Arc::new(FakeApi::default());
            FakeApi::set(&fake.send_verification, reply);
            let mut reset = opened(&fake).await;

            assert!(!reset.verification_sent());
            assert_eq!(reset.error(), Some(message));

            // Verification stays disabled
            reset.code = "123456".to_string();
            assert!(!reset.verify());
        }
    }

    #[tokio::test]
    async fn test_empty_code() {
        let fake = Arc::new(FakeApi::default());
        let mut reset = opened(&fake).await;

        assert!(!reset.verify());
        assert_eq!(reset.error(), Some(MISSING_CODE));
    }

    #[tokio::test]
    async fn test_code_accepted() {
        let fake = Arc::new(FakeApi::default());
        let reset = verified(&fake).await;

        assert_eq!(reset.success(), Some(VERIFIED));
        assert_eq!(reset.error(), None);
        assert!(fake.calls().contains(&format!("verify {EMAIL} 123456")));
    }

    #[tokio::test]
    async fn test_code_rejected() {
        let cases = [(Reply::Status(400), INVALID_CODE), (Reply::Panic, VERIFY_ERROR)];
        for (reply, message) in cases {
            let fake = Arc::new(FakeApi::default());
            FakeApi::set(&fake.verify, reply);
            let mut reset = opened(&fake).await;

            reset.code = "000000".to_string();
            reset.verify();
            reset.settle().await;

            assert_eq!(reset.phase(), ResetPhase::AwaitingVerification);
            assert_eq!(reset.error(), Some(message));
            assert_eq!(reset.success(), None);
        }
    }

    #[tokio::test]
    async fn test_mismatched_passwords_never_post() {
        let fake = Arc::new(FakeApi::default());
        let mut reset = verified(&fake).await;

        reset.new_password = "correct horse".to_string();
        reset.confirm_password = "battery staple".to_string();

        assert!(!reset.submit());
        assert_eq!(reset.error(), Some(PASSWORD_MISMATCH));
        assert_eq!(reset.success(), None);
        assert!(!fake.calls().iter().any(|c| c.starts_with("reset")));
    }

    #[tokio::test]
    async fn test_validation_order() {
        let fake = Arc::new(FakeApi::default());
        let mut reset = opened(&fake).await;

        reset.new_password = "same".to_string();
        assert!(!reset.submit());
        assert_eq!(reset.error(), Some(MISSING_FIELDS));

        reset.confirm_password = "same".to_string();
        assert!(!reset.submit());
        assert_eq!(reset.error(), Some(NOT_VERIFIED));
        assert!(!fake.calls().iter().any(|c| c.starts_with("reset")));
    }

    #[tokio::test]
    async fn test_reset_redirect_goes_to_chat() {
        let fake = Arc::new(FakeApi::default());
        FakeApi::set(&fake.reset, Reply::Ok(FormResponse::Redirect { path: "/chatbot/".to_string() }));
        let mut reset = verified(&fake).await;

        reset.new_password = "n3w-pass".to_string();
        reset.confirm_password = "n3w-pass".to_string();

        assert!(reset.submit());
        assert_eq!(reset.settle().await, Some(Route::Chatbot));
        assert!(fake.calls().contains(&"reset n3w-pass n3w-pass 123456".to_string()));
    }

    #[tokio::test]
    async fn test_reset_page_or_error() {
        let cases = [
            (
                Reply::Ok(FormResponse::Page { status: 200, body: "<p>nope</p>".to_string() }),
                RESET_FAILED,
            ),
            (Reply::Panic, RESET_ERROR),
        ];
        for (reply, message) in cases {
            let fake = Arc::new(FakeApi::default());
            FakeApi::set(&fake.reset, reply);
            let mut reset = verified(&fake).await;

            reset.new_password = "pw".to_string();
            reset.confirm_password = "pw".to_string();
            reset.submit();

            assert_eq!(reset.settle().await, None);
            assert_eq!(reset.error(), Some(message));
        }
    }
}
