use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::LOCATION;
use reqwest::multipart::Form;
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{
    CampusApi, ChatReply, FormResponse, CHATBOT_PATH, CSRF_PATH, LOGIN_PATH, LOGOUT_PATH,
    PASSWORD_RESET_PATH, SEND_VERIFICATION_PATH, USER_INFO_PATH, VERIFY_CODE_PATH,
};
use crate::cookie::{self, CSRF_HEADER};
use crate::error::{ApiError, Result};
use crate::state::SessionUser;

/// `reqwest` transport for the campus backend.
///
/// One client and one cookie jar are shared by every call, so the session
/// and CSRF cookies set by one response are sent with the next request.
/// Redirects are not followed: form posts report where the server wanted
/// to send the user instead.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let jar = Arc::new(Jar::default());

        let client = Client::builder()
            .cookie_provider(jar.clone())
            .redirect(Policy::none())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The CSRF token currently held in the cookie jar.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        cookie::csrf_token(header.to_str().ok()?)
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn get(&self, url: Url) -> RequestBuilder {
        debug!(%url, "GET");
        self.client.get(url)
    }

    /// A POST carrying the CSRF header when a token is available.
    fn post(&self, url: Url) -> RequestBuilder {
        debug!(%url, "POST");
        let request = self.client.post(url);
        match self.csrf_token() {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    async fn form_response(&self, response: Response) -> Result<FormResponse> {
        let status = response.status();

        if status.is_redirection() {
            if let Some(location) = response.headers().get(LOCATION) {
                let location = location.to_str().unwrap_or_default();
                let target = response.url().join(location)?;
                debug!(%status, target = %target, "form redirected");
                return Ok(FormResponse::Redirect {
                    path: target.path().to_string(),
                });
            }
            warn!(%status, "redirect without a Location header");
        }

        let body = response.text().await?;
        Ok(FormResponse::Page {
            status: status.as_u16(),
            body,
        })
    }
}

fn ensure_success(response: &Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        debug!(%status, url = %response.url(), "request rejected");
        Err(ApiError::Status(status.as_u16()))
    }
}

#[async_trait]
impl CampusApi for HttpApi {
    async fn fetch_csrf(&self) -> Result<()> {
        let response = self.get(self.url(CSRF_PATH)?).send().await?;
        ensure_success(&response)
    }

    async fn user_info(&self) -> Result<SessionUser> {
        let response = self.get(self.url(USER_INFO_PATH)?).send().await?;

        if response.status() != StatusCode::OK {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn ask(&self, question: &str) -> Result<ChatReply> {
        let response = self
            .post(self.url(CHATBOT_PATH)?)
            .json(&json!({ "question": question }))
            .send()
            .await?;
        ensure_success(&response)?;

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn logout(&self) -> Result<()> {
        let response = self
            .post(self.url(LOGOUT_PATH)?)
            .json(&json!({}))
            .send()
            .await?;
        ensure_success(&response)
    }

    async fn login(&self, email: &str, password: &str) -> Result<FormResponse> {
        let form = Form::new()
            .text("email", email.to_string())
            .text("password", password.to_string());

        let response = self
            .post(self.url(LOGIN_PATH)?)
            .multipart(form)
            .send()
            .await?;
        self.form_response(response).await
    }

    async fn send_verification_email(&self, email: &str) -> Result<()> {
        let response = self
            .post(self.url(SEND_VERIFICATION_PATH)?)
            .form(&[("email", email)])
            .send()
            .await?;
        ensure_success(&response)
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<()> {
        let form = Form::new()
            .text("email", email.to_string())
            .text("code", code.to_string());

        let response = self
            .post(self.url(VERIFY_CODE_PATH)?)
            .multipart(form)
            .send()
            .await?;
        ensure_success(&response)
    }

    async fn reset_password(
        &self,
        new_password: &str,
        confirm_password: &str,
        verification_code: &str,
    ) -> Result<FormResponse> {
        let form = Form::new()
            .text("new_password", new_password.to_string())
            .text("confirm_password", confirm_password.to_string())
            .text("verification_code", verification_code.to_string());

        let response = self
            .post(self.url(PASSWORD_RESET_PATH)?)
            .multipart(form)
            .send()
            .await?;
        self.form_response(response).await
    }
}
