use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use campusbot_core::{ResetPhase, Route};
use crate::app::{App, LoginField, ResetField};
use crate::tui::AppEvent;

/// Lines moved by PageUp/PageDown in the chat history
const PAGE: u16 = 10;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {
            if let Some(chat) = app.chat.as_mut() {
                chat.scroll_to_bottom();
            }
        }
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work on every screen
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.route {
        Route::Landing => handle_landing(app, key),
        Route::Login => handle_login(app, key),
        Route::Chatbot => handle_chat(app, key),
        Route::PasswordReset => handle_reset(app, key),
    }
}

fn handle_landing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter | KeyCode::Char('l') => app.navigate(Route::Login),
        _ => {}
    }
}

fn handle_login(app: &mut App, key: KeyEvent) {
    let Some(screen) = app.login.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => app.navigate(Route::Landing),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            screen.focus = match screen.focus {
                LoginField::Email => LoginField::Password,
                LoginField::Password => LoginField::Email,
            };
        }
        KeyCode::Enter => match screen.focus {
            LoginField::Email => screen.focus = LoginField::Password,
            LoginField::Password => {
                screen.submit();
            }
        },
        _ => {
            screen.focused_input().handle_key(key);
        }
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    let Some(chat) = app.chat.as_mut() else {
        return;
    };
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Logout confirmation popup
    if chat.show_logout_confirm {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                chat.show_logout_confirm = false;
                chat.session.logout();
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                chat.show_logout_confirm = false;
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.navigate(Route::Landing),
        KeyCode::Enter => {
            chat.submit();
        }
        KeyCode::Char('n') if ctrl => {
            chat.session.new_chat();
            chat.scroll = 0;
        }
        // Logout is only offered to a logged-in user
        KeyCode::Char('o') if ctrl => {
            if chat.session.is_logged_in() {
                chat.show_logout_confirm = true;
            }
        }
        KeyCode::Up => chat.scroll_up(1),
        KeyCode::Down => chat.scroll_down(1),
        KeyCode::PageUp => chat.scroll_up(PAGE),
        KeyCode::PageDown => chat.scroll_down(PAGE),
        _ => {
            if chat.input.handle_key(key) {
                chat.session.set_draft(chat.input.value());
            }
        }
    }
}

fn handle_reset(app: &mut App, key: KeyEvent) {
    let Some(screen) = app.reset.as_mut() else {
        return;
    };

    if key.code == KeyCode::Esc {
        app.navigate(Route::Landing);
        return;
    }

    match screen.reset.phase() {
        ResetPhase::AwaitingVerification => match key.code {
            KeyCode::Enter => {
                screen.verify();
            }
            _ => {
                screen.code.handle_key(key);
            }
        },
        ResetPhase::Verified => match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                screen.focus = match screen.focus {
                    ResetField::NewPassword => ResetField::ConfirmPassword,
                    _ => ResetField::NewPassword,
                };
            }
            KeyCode::Enter => match screen.focus {
                ResetField::ConfirmPassword => {
                    screen.submit();
                }
                _ => screen.focus = ResetField::ConfirmPassword,
            },
            _ => {
                screen.focused_input().handle_key(key);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let api: campusbot_core::SharedApi = std::sync::Arc::new(
            campusbot_core::HttpApi::new("http://127.0.0.1:9", std::time::Duration::from_secs(1)).unwrap(),
        );
        App::new(api, "http://127.0.0.1:9", Some("student@campus.edu".to_string()))
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_ctrl_c_quits_anywhere() {
        let mut app = app();

        handle_key(&mut app, key(KeyCode::Char('x')));
        assert!(!app.should_quit);

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_landing_enter_opens_login_with_password_focused() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Enter));

        assert_eq!(app.route, Route::Login);
        let screen = app.login.as_ref().unwrap();
        assert_eq!(screen.email.value(), "student@campus.edu");
        assert_eq!(screen.focus, LoginField::Password);

        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.login.as_ref().unwrap().focus, LoginField::Email);

        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.route, Route::Landing);
        assert!(app.login.is_none());
    }

    #[tokio::test]
    async fn test_chat_typing_feeds_session_draft() {
        let mut app = app();
        app.navigate(Route::Chatbot);

        type_str(&mut app, "hi");
        handle_key(&mut app, key(KeyCode::Backspace));

        let chat = app.chat.as_ref().unwrap();
        assert_eq!(chat.input.value(), "h");
        assert_eq!(chat.session.draft(), "h");
    }

    #[tokio::test]
    async fn test_logout_prompt_needs_a_user() {
        let mut app = app();
        app.navigate(Route::Chatbot);

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL));
        assert!(!app.chat.as_ref().unwrap().show_logout_confirm);
    }

    #[tokio::test]
    async fn test_reset_escape_returns_home() {
        let mut app = app();
        app.navigate(Route::PasswordReset);
        type_str(&mut app, "1234");
        assert_eq!(app.reset.as_ref().unwrap().code.value(), "1234");

        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.route, Route::Landing);
        assert!(app.reset.is_none());
    }
}
