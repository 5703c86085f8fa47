pub mod api;
pub mod config;
pub mod cookie;
pub mod error;
pub mod login;
pub mod reset;
pub mod route;
pub mod session;
pub mod state;
pub mod task;

// Re-export main types for convenience
pub use api::{CampusApi, ChatReply, FormResponse, HttpApi, SharedApi};
pub use config::Config;
pub use cookie::{csrf_token, read_cookie};
pub use error::{ApiError, Result};
pub use login::LoginForm;
pub use reset::{PasswordReset, ResetPhase};
pub use route::Route;
pub use session::ChatSession;
pub use state::{ChatMessage, Composer, ExtraData, Sender, SessionUser};
pub use task::Pending;
