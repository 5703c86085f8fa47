use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use campusbot_core::{ResetPhase, Route, Sender};
use crate::app::{App, ChatScreen, LoginField, LoginScreen, ResetField, ResetScreen};
use crate::input::TextInput;

const ACCENT: Color = Color::Magenta;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let dots = ".".repeat(app.animation_frame as usize + 1);
    match app.route {
        Route::Landing => render_landing(frame, body_area),
        Route::Login => {
            if let Some(screen) = app.login.as_ref() {
                render_login(screen, &dots, frame, body_area);
            }
        }
        Route::Chatbot => {
            if let Some(chat) = app.chat.as_mut() {
                render_chat(chat, &dots, frame, body_area);
            }
        }
        Route::PasswordReset => {
            if let Some(screen) = app.reset.as_ref() {
                render_reset(screen, &dots, frame, body_area);
            }
        }
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" CampusBot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.route.title(), Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("  {}", app.base_url), Style::default().fg(Color::DarkGray)),
    ];

    if let Some(user) = app.chat.as_ref().and_then(|c| c.session.user()) {
        spans.push(Span::styled(
            format!("  Logged in as {}", user.username),
            Style::default().fg(ACCENT),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = Style::default().bg(Color::Blue).fg(Color::White);

    let mode_text = match app.route {
        Route::Landing => " HOME ",
        Route::Login => " LOGIN ",
        Route::Chatbot => " CHAT ",
        Route::PasswordReset => " RESET ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |k: &'static str, label: &'static str| {
        [Span::styled(k, key_style), Span::styled(label, label_style)]
    };

    let mut hints: Vec<Span> = Vec::new();
    match app.route {
        Route::Landing => {
            hints.extend(hint(" Enter ", " get started "));
            hints.extend(hint(" q ", " quit "));
        }
        Route::Login => {
            hints.extend(hint(" Tab ", " next field "));
            hints.extend(hint(" Enter ", " login "));
            hints.extend(hint(" Esc ", " back "));
        }
        Route::Chatbot => {
            let confirming = app.chat.as_ref().is_some_and(|c| c.show_logout_confirm);
            if confirming {
                hints.extend(hint(" y ", " logout "));
                hints.extend(hint(" n ", " cancel "));
            } else {
                hints.extend(hint(" Enter ", " send "));
                hints.extend(hint(" PgUp/PgDn ", " scroll "));
                hints.extend(hint(" ^N ", " new chat "));
                if app.chat.as_ref().is_some_and(|c| c.session.is_logged_in()) {
                    hints.extend(hint(" ^O ", " logout "));
                }
                hints.extend(hint(" Esc ", " home "));
            }
        }
        Route::PasswordReset => {
            let verified = app
                .reset
                .as_ref()
                .is_some_and(|r| r.reset.phase() == ResetPhase::Verified);
            if verified {
                hints.extend(hint(" Tab ", " next field "));
                hints.extend(hint(" Enter ", " reset password "));
            } else {
                hints.extend(hint(" Enter ", " verify code "));
            }
            hints.extend(hint(" Esc ", " cancel "));
        }
    }
    hints.extend(hint(" ^C ", " quit "));

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// A rectangle of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_landing(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::from(Span::styled(
            "Transform Ideas into Reality",
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
        Line::from(vec![
            Span::raw("Examine the Potential of Genius's "),
            Span::styled("Campus ", Style::default().fg(Color::LightMagenta).bold()),
            Span::styled("ChatBot", Style::default().fg(ACCENT).bold()),
        ]),
        Line::default(),
        Line::from(
            "CampusBot is an intelligent assistant designed to enhance student experiences \
             by providing seamless access to campus resources. Whether you need help with \
             academic schedules, event updates or faculty contacts, CampusBot simplifies \
             navigation and streamlines communication.",
        ),
        Line::default(),
        Line::from(Span::styled(
            "Press Enter to get started",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(" CampusBot ");

    let landing = Paragraph::new(text)
        .block(block)
        .centered()
        .wrap(Wrap { trim: true });

    frame.render_widget(landing, centered(area, 72, 14));
}

/// Draw a labelled single-line field and place the cursor if it has focus.
fn render_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    input: &TextInput,
    masked: bool,
    focused: bool,
) {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {label} "));

    let inner_width = area.width.saturating_sub(2) as usize;
    let (text, cursor) = if masked {
        input.masked(inner_width)
    } else {
        input.visible(inner_width)
    };

    let field = Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(field, area);

    if focused {
        frame.set_cursor_position((area.x + cursor as u16 + 1, area.y + 1));
    }
}

fn status_line(error: Option<&str>, success: Option<&str>, busy: Option<String>) -> Paragraph<'static> {
    let line = if let Some(error) = error {
        Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red).bold()))
    } else if let Some(success) = success {
        Line::from(Span::styled(success.to_string(), Style::default().fg(Color::Green).bold()))
    } else if let Some(busy) = busy {
        Line::from(Span::styled(
            busy,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::default()
    };
    Paragraph::new(line).wrap(Wrap { trim: true })
}

fn render_login(screen: &LoginScreen, dots: &str, frame: &mut Frame, area: Rect) {
    let popup = centered(area, 50, 13);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(" Login to NOVA ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [email_area, password_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(1),
    ])
    .areas(inner);

    render_field(frame, email_area, "E-mail", &screen.email, false, screen.focus == LoginField::Email);
    render_field(
        frame,
        password_area,
        "Password",
        &screen.password,
        true,
        screen.focus == LoginField::Password,
    );

    let busy = screen.form.is_submitting().then(|| format!("Signing in{dots}"));
    frame.render_widget(status_line(screen.form.error(), None, busy), status_area);
}

fn render_chat(chat: &mut ChatScreen, dots: &str, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    chat.chat_height = chat_area.height.saturating_sub(2);
    chat.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(" WELCOME TO NOVA ");

    let session = &chat.session;
    let chat_text = if session.messages().is_empty() && !session.is_in_flight() {
        Text::from(Span::styled(
            "Ask about schedules, events, faculty contacts...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in session.messages() {
            match msg.sender {
                Sender::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                }
                Sender::Bot => {
                    lines.push(Line::from(Span::styled(
                        "NOVA:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                }
            }
            for line in msg.text.lines() {
                lines.push(Line::from(line.to_string()));
            }
            if let Some(extra) = &msg.extra_data {
                for (key, value) in extra {
                    lines.push(Line::from(vec![
                        Span::raw("  • "),
                        Span::styled(format!("{key}:"), Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(format!(" {value}")),
                    ]));
                }
            }
            lines.push(Line::default());
        }

        if session.is_in_flight() {
            lines.push(Line::from(Span::styled(
                "NOVA:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("Loading{dots}"),
                Style::default().fg(ACCENT).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let history = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((chat.scroll, 0));
    frame.render_widget(history, chat_area);

    let title = if session.is_in_flight() {
        "Waiting for NOVA"
    } else {
        "Type your message"
    };
    render_field(frame, input_area, title, &chat.input, false, !chat.show_logout_confirm);

    if chat.show_logout_confirm {
        render_logout_confirm(frame, area);
    }
}

fn render_logout_confirm(frame: &mut Frame, area: Rect) {
    let popup = centered(area, 44, 5);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Logout ");

    let text = Text::from(vec![
        Line::from("Are you sure you want to logout?"),
        Line::from(vec![
            Span::styled(" y ", Style::default().bg(Color::Red).fg(Color::White)),
            Span::raw(" Yes   "),
            Span::styled(" n ", Style::default().bg(Color::Cyan).fg(Color::Black)),
            Span::raw(" No"),
        ]),
    ]);

    frame.render_widget(Paragraph::new(text).block(block).centered(), popup);
}

fn render_reset(screen: &ResetScreen, dots: &str, frame: &mut Frame, area: Rect) {
    let reset = &screen.reset;
    let popup = centered(area, 56, 16);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Password Reset ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [info_area, first_area, second_area, status_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(1),
    ])
    .areas(inner);

    let info = match reset.phase() {
        ResetPhase::AwaitingVerification if reset.verification_sent() => {
            format!("A verification code was sent to {}.", reset.email())
        }
        ResetPhase::AwaitingVerification => format!("Verification code for {}", reset.email()),
        ResetPhase::Verified => "Choose a new password.".to_string(),
    };
    frame.render_widget(
        Paragraph::new(info).style(Style::default().fg(Color::DarkGray)).wrap(Wrap { trim: true }),
        info_area,
    );

    let busy = match reset.phase() {
        ResetPhase::AwaitingVerification => {
            if !reset.verification_sent() && reset.error().is_none() {
                Some(format!("Sending verification code{dots}"))
            } else if reset.is_busy() {
                Some(format!("Verifying{dots}"))
            } else {
                None
            }
        }
        ResetPhase::Verified => reset.is_busy().then(|| format!("Resetting password{dots}")),
    };

    match reset.phase() {
        ResetPhase::AwaitingVerification => {
            render_field(frame, first_area, "Verification Code", &screen.code, false, true);
        }
        ResetPhase::Verified => {
            render_field(
                frame,
                first_area,
                "New Password",
                &screen.new_password,
                true,
                screen.focus == ResetField::NewPassword,
            );
            render_field(
                frame,
                second_area,
                "Confirm Password",
                &screen.confirm_password,
                true,
                screen.focus == ResetField::ConfirmPassword,
            );
        }
    }

    frame.render_widget(status_line(reset.error(), reset.success(), busy), status_area);
}
