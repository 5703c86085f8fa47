/// Client-side screens, addressed by the same paths the web client used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Chatbot,
    PasswordReset,
}

impl Route {
    pub fn as_path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Chatbot => "/chatbot",
            Route::PasswordReset => "/password-reset",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Landing),
            "/login" => Some(Route::Login),
            "/chatbot" => Some(Route::Chatbot),
            "/password-reset" => Some(Route::PasswordReset),
            _ => None,
        }
    }

    /// Map the target of a server redirect after login.
    ///
    /// Only the two known server pages are followed; anything else lands on
    /// the root screen.
    pub fn from_redirect(path: &str) -> Self {
        match path {
            "/password-reset/" => Route::PasswordReset,
            "/chatbot/" => Route::Chatbot,
            _ => Route::Landing,
        }
    }

    pub fn all() -> Vec<Route> {
        vec![Route::Landing, Route::Login, Route::Chatbot, Route::PasswordReset]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Landing => "Home",
            Route::Login => "Login",
            Route::Chatbot => "Chat",
            Route::PasswordReset => "Password Reset",
        }
    }
}
