//! Login Form Controller

use scraper::{Html, Selector};
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::api::{FormResponse, SharedApi};
use crate::error::Result;
use crate::route::Route;
use crate::task::Pending;

pub const MISSING_FIELDS: &str = "Please enter both email and password.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub const LOGIN_FAILED: &str = "Login failed.";
pub const LOGIN_ERROR: &str = "An error occurred during login.";

/// Elements the login page uses to report a failed attempt.
const ERROR_SELECTOR: &str = ".error, #error, .error-message";

/// Fields in a JSON error body, in order of preference.
const ERROR_FIELDS: [&str; 3] = ["error", "detail", "message"];

pub struct LoginForm {
    api: SharedApi,
    pub email: String,
    pub password: String,
    error: Option<String>,
    submission: Option<Pending<Result<FormResponse>>>,
    _csrf: Pending<()>,
}

impl LoginForm {
    /// Show the login form and make sure the server has issued a CSRF cookie.
    pub fn open(api: SharedApi, email: Option<String>) -> Self {
        let csrf_api = api.clone();
        let csrf = Pending::spawn(async move {
            if let Err(e) = csrf_api.fetch_csrf().await {
                debug!(error = %e, "csrf bootstrap failed");
            }
        });

        Self {
            api,
            email: email.unwrap_or_default(),
            password: String::new(),
            error: None,
            submission: None,
            _csrf: csrf,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submission.is_some()
    }

    /// Validate and post the credentials. Returns whether a request was sent.
    pub fn submit(&mut self) -> bool {
        if self.submission.is_some() {
            return false;
        }
        if self.email.is_empty() || self.password.is_empty() {
            self.error = Some(MISSING_FIELDS.to_string());
            return false;
        }
        self.error = None;

        let api = self.api.clone();
        let email = self.email.clone();
        let password = self.password.clone();
        self.submission = Some(Pending::spawn(async move {
            api.login(&email, &password).await
        }));
        true
    }

    /// Apply a finished login attempt, returning where to navigate.
    pub fn poll(&mut self) -> Option<Route> {
        let outcome = self.submission.as_mut().and_then(|p| p.poll())?;
        self.submission = None;
        self.apply(outcome)
    }

    /// Wait for the pending login attempt, if any.
    pub async fn settle(&mut self) -> Option<Route> {
        let pending = self.submission.take()?;
        let outcome = pending.join().await;
        self.apply(outcome)
    }

    fn apply(&mut self, outcome: std::result::Result<Result<FormResponse>, JoinError>) -> Option<Route> {
        match outcome {
            Ok(Ok(FormResponse::Redirect { path })) => {
                let route = Route::from_redirect(&path);
                info!(target = %path, route = route.as_path(), "login redirected");
                Some(route)
            }
            Ok(Ok(FormResponse::Page { status, body })) => {
                debug!(status, "login rejected");
                self.error = Some(extract_error_message(&body));
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "login request failed");
                self.error = Some(LOGIN_ERROR.to_string());
                None
            }
            Err(e) => {
                warn!(error = %e, "login request did not complete");
                self.error = Some(LOGIN_ERROR.to_string());
                None
            }
        }
    }
}

/// Pull a human-readable error out of a rejected login response.
///
/// A structured JSON error is preferred. Otherwise the page is searched for
/// the first error element the server templates render.
pub fn extract_error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        let found = ERROR_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_str))
            .map(str::trim)
            .filter(|text| !text.is_empty());
        if let Some(text) = found {
            return text.to_string();
        }
    }

    let Ok(selector) = Selector::parse(ERROR_SELECTOR) else {
        return INVALID_CREDENTIALS.to_string();
    };
    let document = Html::parse_document(body);

    match document.select(&selector).next() {
        Some(element) => {
            let text = element.text().collect::<String>();
            let text = text.trim();
            if text.is_empty() {
                LOGIN_FAILED.to_string()
            } else {
                text.to_string()
            }
        }
        None => INVALID_CREDENTIALS.to_string(),
    }
}
