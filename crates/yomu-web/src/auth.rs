//! Browser side of authentication: the HTTP client of the auth backend,
//! the local storage session store and the guard run on startup.

use std::rc::Rc;

use async_trait::async_trait;
use futures::future::{select, Either};
use futures::Future;
use gloo_timers::future::TimeoutFuture;
use serde::{Deserialize, Serialize};
use wasm_bindgen::UnwrapThrowExt;
use yomu_lib::auth::{
    AuthManager, AuthProvider, ProviderSession, RetryPolicy, Session, SessionStore, Tokens,
};
use yomu_lib::entitlement::Role;
use yomu_lib::error::{Error, Result};

use crate::utils::{auth_key, auth_url, local_storage};

const ACCESS_TOKEN_KEY: &str = "accessToken";
const REFRESH_TOKEN_KEY: &str = "refreshToken";
const IS_ADMIN_KEY: &str = "isAdmin";
const USER_ID_KEY: &str = "userId";

thread_local! {
    static AUTH: Rc<AuthManager> = Rc::new(AuthManager::new(Rc::new(LocalSessionStore), RetryPolicy::default()));
}

pub fn auth() -> Rc<AuthManager> {
    AUTH.with(|auth| auth.clone())
}

/// `None` when the hosting page configured no auth backend
pub fn provider() -> Option<TimeoutProvider<AuthClient>> {
    let url = auth_url()?;
    let timeout_ms = auth().retry_policy().timeout_ms;
    Some(TimeoutProvider::new(AuthClient::new(url, auth_key()), timeout_ms))
}

/// Runs the guard sequence, requests stay queued until it settles
pub async fn initialize() {
    let auth = auth();
    match provider() {
        Some(provider) => {
            if let Err(e) = auth.initialize(&provider).await {
                error!("auth guard gave up: {}", e);
            }
        }
        None => auth.set_auth_required(false),
    }
}

pub struct LocalSessionStore;

fn storage_error(e: wasm_bindgen::JsValue) -> Error {
    Error::Storage(e.as_string().unwrap_or_else(|| "unknown reason".to_string()))
}

impl SessionStore for LocalSessionStore {
    fn load(&self) -> Option<Session> {
        let storage = local_storage();
        let access_token = storage.get(ACCESS_TOKEN_KEY).unwrap_throw()?;
        let refresh_token = storage.get(REFRESH_TOKEN_KEY).unwrap_throw()?;
        let user_id = storage.get(USER_ID_KEY).unwrap_throw()?;
        let is_admin = storage.get(IS_ADMIN_KEY).unwrap_throw();

        Some(Session {
            user_id,
            tokens: Tokens {
                access_token,
                refresh_token,
            },
            role: Role::from_flag(is_admin.as_deref()),
        })
    }

    fn save(&self, session: &Session) -> Result<()> {
        let storage = local_storage();
        storage
            .set(ACCESS_TOKEN_KEY, &session.tokens.access_token)
            .map_err(storage_error)?;
        storage
            .set(REFRESH_TOKEN_KEY, &session.tokens.refresh_token)
            .map_err(storage_error)?;
        storage.set(USER_ID_KEY, &session.user_id).map_err(storage_error)?;
        storage.set(IS_ADMIN_KEY, session.role.as_flag()).map_err(storage_error)?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let storage = local_storage();
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_ID_KEY, IS_ADMIN_KEY] {
            storage.delete(key).map_err(storage_error)?;
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: UserResponse,
}

impl From<TokenResponse> for ProviderSession {
    fn from(res: TokenResponse) -> Self {
        ProviderSession {
            user_id: res.user.id,
            tokens: Tokens {
                access_token: res.access_token,
                refresh_token: res.refresh_token,
            },
        }
    }
}

#[derive(Deserialize)]
struct ProfileRow {
    role: Option<String>,
}

#[derive(Deserialize, Default)]
struct ErrorResponse {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ErrorResponse {
    fn into_message(self) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .unwrap_or_default()
    }
}

fn provider_error(e: reqwest::Error) -> Error {
    Error::Provider(e.to_string())
}

/// HTTP client of a GoTrue compatible auth backend with a PostgREST
/// `profiles` table next to it
pub struct AuthClient {
    url: String,
    key: String,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(url: String, key: String) -> Self {
        Self {
            url,
            key,
            client: reqwest::Client::new(),
        }
    }

    async fn post_token<B: Serialize + ?Sized>(&self, grant_type: &str, body: &B) -> Result<reqwest::Response> {
        self.client
            .post(format!("{}/auth/v1/token?grant_type={}", self.url, grant_type))
            .header("apikey", &self.key)
            .json(body)
            .send()
            .await
            .map_err(provider_error)
    }

    async fn session_from(res: reqwest::Response) -> Result<ProviderSession> {
        if !res.status().is_success() {
            return Err(Self::error_from(res).await);
        }

        let token: TokenResponse = res.json().await.map_err(provider_error)?;
        Ok(token.into())
    }

    async fn error_from(res: reqwest::Response) -> Error {
        let status = res.status();
        let body: ErrorResponse = res.json().await.unwrap_or_default();
        let message = body.into_message();
        debug!("auth backend responded {}: {}", status, message);
        Error::Provider(message)
    }
}

#[async_trait(?Send)]
impl AuthProvider for AuthClient {
    async fn get_session(&self) -> Result<Option<ProviderSession>> {
        let Some(refresh_token) = local_storage().get(REFRESH_TOKEN_KEY).unwrap_throw() else {
            return Ok(None);
        };

        let res = self
            .post_token(
                "refresh_token",
                &RefreshRequest {
                    refresh_token: &refresh_token,
                },
            )
            .await?;

        // a revoked refresh token means signed out, not a failed attempt
        if res.status().is_client_error() {
            let e = Self::error_from(res).await;
            info!("stored session rejected: {}", e);
            LocalSessionStore.clear()?;
            return Ok(None);
        }

        Self::session_from(res).await.map(Some)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession> {
        let res = self.post_token("password", &Credentials { email, password }).await?;
        Self::session_from(res).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        let res = self
            .client
            .post(format!("{}/auth/v1/signup", self.url))
            .header("apikey", &self.key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(provider_error)?;

        if !res.status().is_success() {
            return Err(Self::error_from(res).await);
        }

        Ok(())
    }

    async fn fetch_role(&self, session: &ProviderSession) -> Result<Option<String>> {
        let res = self
            .client
            .get(format!(
                "{}/rest/v1/profiles?select=role&id=eq.{}",
                self.url, session.user_id
            ))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.tokens.access_token))
            .send()
            .await
            .map_err(provider_error)?;

        if !res.status().is_success() {
            return Err(Self::error_from(res).await);
        }

        let rows: Vec<ProfileRow> = res.json().await.map_err(provider_error)?;
        Ok(rows.into_iter().next().and_then(|row| row.role))
    }
}

/// Fails each provider call that takes longer than `timeout_ms` with
/// [`Error::Timeout`], which the manager retries like any other failure
pub struct TimeoutProvider<P> {
    inner: P,
    timeout_ms: u32,
}

impl<P> TimeoutProvider<P> {
    pub fn new(inner: P, timeout_ms: u32) -> Self {
        Self { inner, timeout_ms }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        futures::pin_mut!(fut);
        match select(fut, TimeoutFuture::new(self.timeout_ms)).await {
            Either::Left((res, _)) => res,
            Either::Right(_) => {
                warn!("auth backend did not answer within {}ms", self.timeout_ms);
                Err(Error::Timeout)
            }
        }
    }
}

#[async_trait(?Send)]
impl<P: AuthProvider> AuthProvider for TimeoutProvider<P> {
    async fn get_session(&self) -> Result<Option<ProviderSession>> {
        self.with_timeout(self.inner.get_session()).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession> {
        self.with_timeout(self.inner.sign_in_with_password(email, password))
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        self.with_timeout(self.inner.sign_up(email, password)).await
    }

    async fn fetch_role(&self, session: &ProviderSession) -> Result<Option<String>> {
        self.with_timeout(self.inner.fetch_role(session)).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_message_precedence() {
        let body: ErrorResponse =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .unwrap();
        assert_eq!(body.into_message(), "Invalid login credentials");

        let body: ErrorResponse = serde_json::from_str(r#"{"msg":"User already registered"}"#).unwrap();
        assert_eq!(body.into_message(), "User already registered");

        assert_eq!(ErrorResponse::default().into_message(), "");
    }

    #[test]
    fn test_token_response() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","token_type":"bearer","refresh_token":"r","user":{"id":"u1","email":"x@y.z"}}"#,
        )
        .unwrap();
        let session = ProviderSession::from(token);
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.tokens.access_token, "a");
        assert_eq!(session.tokens.refresh_token, "r");
    }

    #[test]
    fn test_profile_rows() {
        let rows: Vec<ProfileRow> = serde_json::from_str(r#"[{"role":"admin"}]"#).unwrap();
        assert_eq!(rows[0].role.as_deref(), Some("admin"));
        let rows: Vec<ProfileRow> = serde_json::from_str("[]").unwrap();
        assert!(rows.is_empty());
    }
}
