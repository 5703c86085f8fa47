use campusbot_core::{
    ChatMessage, ChatSession, Config, LoginForm, PasswordReset, ResetPhase, Route, SharedApi,
};
use tracing::{info, warn};

use crate::input::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetField {
    Code,
    NewPassword,
    ConfirmPassword,
}

pub struct LoginScreen {
    pub form: LoginForm,
    pub email: TextInput,
    pub password: TextInput,
    pub focus: LoginField,
}

impl LoginScreen {
    pub fn focused_input(&mut self) -> &mut TextInput {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    /// Copy the fields into the form and post it.
    pub fn submit(&mut self) -> bool {
        self.form.email = self.email.value().to_string();
        self.form.password = self.password.value().to_string();
        self.form.submit()
    }
}

pub struct ChatScreen {
    pub session: ChatSession,
    pub input: TextInput,
    pub scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub show_logout_confirm: bool,
}

impl ChatScreen {
    pub fn submit(&mut self) -> bool {
        self.session.set_draft(self.input.value());
        if !self.session.submit() {
            return false;
        }
        self.input.clear();
        self.scroll_to_bottom();
        true
    }

    /// Scroll so the newest message (or "Loading...") is visible
    pub fn scroll_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.session.messages() {
            total_lines = total_lines.saturating_add(message_height(msg, wrap_width));
        }

        if self.session.is_in_flight() {
            total_lines = total_lines.saturating_add(2); // "NOVA:" + "Loading..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.scroll = total_lines.saturating_sub(visible_height);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }
}

/// Rendered height of a message: sender line, wrapped text, extra data, blank line.
fn message_height(msg: &ChatMessage, wrap_width: usize) -> u16 {
    let wrapped = |line: &str| -> u16 {
        // Use character count, not byte length, for proper UTF-8 handling
        let char_count = line.chars().count();
        if char_count == 0 {
            1
        } else {
            ((char_count / wrap_width) + 1) as u16
        }
    };

    let mut lines: u16 = 2;
    for line in msg.text.lines() {
        lines = lines.saturating_add(wrapped(line));
    }
    if let Some(extra) = &msg.extra_data {
        for (key, value) in extra {
            lines = lines.saturating_add(wrapped(&format!("  • {key}: {value}")));
        }
    }
    lines
}

pub struct ResetScreen {
    pub reset: PasswordReset,
    pub code: TextInput,
    pub new_password: TextInput,
    pub confirm_password: TextInput,
    pub focus: ResetField,
}

impl ResetScreen {
    pub fn focused_input(&mut self) -> &mut TextInput {
        match self.focus {
            ResetField::Code => &mut self.code,
            ResetField::NewPassword => &mut self.new_password,
            ResetField::ConfirmPassword => &mut self.confirm_password,
        }
    }

    pub fn verify(&mut self) -> bool {
        self.reset.code = self.code.value().to_string();
        self.reset.verify()
    }

    pub fn submit(&mut self) -> bool {
        self.reset.new_password = self.new_password.value().to_string();
        self.reset.confirm_password = self.confirm_password.value().to_string();
        self.reset.submit()
    }
}

pub struct App {
    pub should_quit: bool,
    pub route: Route,
    pub base_url: String,

    // Screen state; only the active screen's slot is populated
    pub login: Option<LoginScreen>,
    pub chat: Option<ChatScreen>,
    pub reset: Option<ResetScreen>,

    /// Email used for password reset: the last login attempt or `--email`
    pub account_email: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    api: SharedApi,
}

impl App {
    pub fn new(api: SharedApi, base_url: impl Into<String>, account_email: Option<String>) -> Self {
        Self {
            should_quit: false,
            route: Route::Landing,
            base_url: base_url.into(),
            login: None,
            chat: None,
            reset: None,
            account_email,
            animation_frame: 0,
            api,
        }
    }

    /// Switch screens. The previous screen's state is dropped, which aborts
    /// any of its requests still in flight.
    pub fn navigate(&mut self, route: Route) {
        info!(from = self.route.as_path(), to = route.as_path(), "navigate");

        self.login = None;
        self.chat = None;
        self.reset = None;

        match route {
            Route::Landing => {}
            Route::Login => {
                let form = LoginForm::open(self.api.clone(), self.account_email.clone());
                let email = TextInput::with_value(form.email.clone());
                let focus = if email.value().is_empty() {
                    LoginField::Email
                } else {
                    LoginField::Password
                };
                self.login = Some(LoginScreen {
                    form,
                    email,
                    password: TextInput::default(),
                    focus,
                });
            }
            Route::Chatbot => {
                self.chat = Some(ChatScreen {
                    session: ChatSession::open(self.api.clone()),
                    input: TextInput::default(),
                    scroll: 0,
                    chat_height: 0,
                    chat_width: 0,
                    show_logout_confirm: false,
                });
            }
            Route::PasswordReset => {
                let email = self.account_email.clone().unwrap_or_default();
                self.reset = Some(ResetScreen {
                    reset: PasswordReset::open(self.api.clone(), email),
                    code: TextInput::default(),
                    new_password: TextInput::default(),
                    confirm_password: TextInput::default(),
                    focus: ResetField::Code,
                });
            }
        }

        self.route = route;
    }

    /// Collect finished requests for the active screen and follow any
    /// navigation they trigger.
    pub fn poll(&mut self) {
        let next = match self.route {
            Route::Landing => None,
            Route::Login => self.poll_login(),
            Route::Chatbot => self.chat.as_mut().and_then(|chat| {
                let before = chat.session.messages().len();
                let next = chat.session.poll();
                if chat.session.messages().len() != before {
                    chat.scroll_to_bottom();
                }
                next
            }),
            Route::PasswordReset => self.reset.as_mut().and_then(|screen| {
                let next = screen.reset.poll();
                if screen.reset.phase() == ResetPhase::Verified
                    && screen.focus == ResetField::Code
                {
                    screen.focus = ResetField::NewPassword;
                }
                next
            }),
        };

        if let Some(route) = next {
            self.navigate(route);
        }
    }

    fn poll_login(&mut self) -> Option<Route> {
        let screen = self.login.as_mut()?;
        let route = screen.form.poll()?;

        let email = screen.form.email.clone();
        if route != Route::Landing {
            if let Err(e) = Config::save_last_email(&email) {
                warn!(error = %e, "could not remember login email");
            }
        }
        self.account_email = Some(email);
        Some(route)
    }

    pub fn is_busy(&self) -> bool {
        match self.route {
            Route::Landing => false,
            Route::Login => self.login.as_ref().is_some_and(|s| s.form.is_submitting()),
            Route::Chatbot => self
                .chat
                .as_ref()
                .is_some_and(|c| c.session.is_in_flight() || c.session.is_logging_out()),
            Route::PasswordReset => self.reset.as_ref().is_some_and(|r| {
                r.reset.is_busy() || (!r.reset.verification_sent() && r.reset.error().is_none())
            }),
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campusbot_core::{ApiError, CampusApi, ChatReply, FormResponse, SessionUser};
    use std::sync::Arc;

    /// Backend that answers every chat question and rejects everything else.
    struct EchoApi;

    #[async_trait]
    impl CampusApi for EchoApi {
        async fn fetch_csrf(&self) -> campusbot_core::Result<()> {
            Ok(())
        }
        async fn user_info(&self) -> campusbot_core::Result<SessionUser> {
            Ok(SessionUser { username: "alice".to_string() })
        }
        async fn ask(&self, question: &str) -> campusbot_core::Result<ChatReply> {
            Ok(ChatReply {
                answer: Some(format!("echo: {question}")),
                extra_data: None,
            })
        }
        async fn logout(&self) -> campusbot_core::Result<()> {
            Ok(())
        }
        async fn login(&self, _email: &str, _password: &str) -> campusbot_core::Result<FormResponse> {
            Err(ApiError::Status(500))
        }
        async fn send_verification_email(&self, _email: &str) -> campusbot_core::Result<()> {
            Ok(())
        }
        async fn verify_code(&self, _email: &str, _code: &str) -> campusbot_core::Result<()> {
            Err(ApiError::Status(400))
        }
        async fn reset_password(&self, _: &str, _: &str, _: &str) -> campusbot_core::Result<FormResponse> {
            Err(ApiError::Status(500))
        }
    }

    fn app() -> App {
        App::new(Arc::new(EchoApi), "http://campus.test", Some("alice@campus.edu".to_string()))
    }

    async fn poll_until(app: &mut App, done: impl Fn(&App) -> bool) {
        while !done(app) {
            tokio::task::yield_now().await;
            app.poll();
        }
    }

    #[tokio::test]
    async fn test_only_active_screen_has_state() {
        let mut app = app();
        app.navigate(Route::Login);
        assert!(app.login.is_some());

        app.navigate(Route::Chatbot);
        assert!(app.login.is_none());
        assert!(app.chat.is_some());

        app.navigate(Route::Landing);
        assert!(app.chat.is_none());
    }

    #[tokio::test]
    async fn test_login_prefills_known_email() {
        let mut app = app();
        app.navigate(Route::Login);

        let login = app.login.as_ref().unwrap();
        assert_eq!(login.email.value(), "alice@campus.edu");
        assert_eq!(login.focus, LoginField::Password);
    }

    #[tokio::test]
    async fn test_chat_round_trip_through_poll() {
        let mut app = app();
        app.navigate(Route::Chatbot);

        let chat = app.chat.as_mut().unwrap();
        chat.input = TextInput::with_value("hi");
        assert!(chat.submit());
        assert_eq!(chat.input.value(), "");

        poll_until(&mut app, |app| {
            app.chat.as_ref().is_some_and(|c| c.session.messages().len() == 2)
        })
        .await;

        let chat = app.chat.as_ref().unwrap();
        assert_eq!(chat.session.messages()[1].text, "echo: hi");
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn test_logout_returns_to_landing() {
        let mut app = app();
        app.navigate(Route::Chatbot);
        app.chat.as_mut().unwrap().session.logout();

        poll_until(&mut app, |app| app.route == Route::Landing).await;
        assert!(app.chat.is_none());
    }

    #[tokio::test]
    async fn test_reset_uses_account_email() {
        let mut app = app();
        app.navigate(Route::PasswordReset);

        poll_until(&mut app, |app| {
            app.reset.as_ref().is_some_and(|r| r.reset.verification_sent())
        })
        .await;
        assert_eq!(app.reset.as_ref().unwrap().reset.email(), "alice@campus.edu");
    }
}
