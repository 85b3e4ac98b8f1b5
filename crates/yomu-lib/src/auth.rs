//! Session handling on top of a third-party auth backend.
//!
//! [`AuthManager`] owns the session and the initialization state machine
//! `Unauthenticated -> Authenticating -> Ready | Error`. Network calls made
//! before the machine settles wait on [`AuthManager::wait_until_settled`].

use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use futures_signals::signal::{Mutable, Signal, SignalExt};
use serde::{Deserialize, Serialize};

use crate::entitlement::{Role, Subject};
use crate::error::{Error, Result};

/// Shown when the provider error carries no message
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed";
pub const SIGN_UP_SUCCESS_MESSAGE: &str = "Account created! You can now log in.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Session as returned by the auth backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderSession {
    pub user_id: String,
    pub tokens: Tokens,
}

/// Session scoped to this client, passed to whoever needs the role
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Session {
    pub user_id: String,
    pub tokens: Tokens,
    pub role: Role,
}

impl Session {
    pub fn subject(&self) -> Subject {
        Subject::new(self.role)
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.tokens.access_token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    Authenticating { attempt: u32 },
    Ready,
    Error(String),
}

impl AuthPhase {
    pub fn is_settled(&self) -> bool {
        matches!(self, AuthPhase::Ready | AuthPhase::Error(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AuthPhase::Ready)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Per attempt, enforced by the caller since timers are platform specific
    pub timeout_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[async_trait(?Send)]
pub trait AuthProvider {
    /// Session persisted by the provider itself, if any
    async fn get_session(&self) -> Result<Option<ProviderSession>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<()>;

    /// `role` column of the `profiles` row keyed by the session's user id
    async fn fetch_role(&self, session: &ProviderSession) -> Result<Option<String>>;
}

/// Where the session survives page reloads
pub trait SessionStore {
    fn load(&self) -> Option<Session>;

    fn save(&self, session: &Session) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

pub struct AuthManager {
    phase: Mutable<AuthPhase>,
    session: Mutable<Option<Session>>,
    auth_required: Mutable<Option<bool>>,
    retry: RetryPolicy,
    store: Rc<dyn SessionStore>,
}

impl AuthManager {
    pub fn new(store: Rc<dyn SessionStore>, retry: RetryPolicy) -> Self {
        let session = store.load();
        Self {
            phase: Mutable::new(AuthPhase::Unauthenticated),
            session: Mutable::new(session),
            auth_required: Mutable::new(None),
            retry,
            store,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase.get_cloned()
    }

    pub fn phase_signal(&self) -> impl Signal<Item = AuthPhase> + use<> {
        self.phase.signal_cloned()
    }

    pub fn session(&self) -> Option<Session> {
        self.session.get_cloned()
    }

    pub fn session_signal(&self) -> impl Signal<Item = Option<Session>> + use<> {
        self.session.signal_cloned()
    }

    /// `None` until the guard mounted, the splash screen shows meanwhile
    pub fn auth_required_signal(&self) -> impl Signal<Item = Option<bool>> + use<> {
        self.auth_required.signal()
    }

    pub fn set_auth_required(&self, required: bool) {
        self.auth_required.set_neq(Some(required));
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.lock_ref().is_some()
    }

    pub fn subject(&self) -> Subject {
        self.session
            .lock_ref()
            .as_ref()
            .map(Session::subject)
            .unwrap_or(Subject::new(Role::Member))
    }

    pub fn authorization_header(&self) -> Option<String> {
        self.session.lock_ref().as_ref().map(Session::bearer)
    }

    /// Resolves once initialization either succeeded or gave up.
    ///
    /// Requests issued while auth is not required at all are never held.
    pub fn wait_until_settled(&self) -> impl Future<Output = ()> + 'static {
        let required = self.auth_required.get() != Some(false);
        let settled = self.phase.signal_ref(AuthPhase::is_settled).wait_for(true);
        async move {
            if required {
                settled.await;
            }
        }
    }

    /// The guard sequence: declare auth required, pick up the provider
    /// session, resolve the role and release queued requests.
    pub async fn initialize<P>(&self, provider: &P) -> Result<()>
    where
        P: AuthProvider + ?Sized,
    {
        self.set_auth_required(true);

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.phase.set(AuthPhase::Authenticating { attempt });
            debug!("auth initialization attempt {}", attempt);

            match self.restore_session(provider).await {
                Ok(()) => {
                    info!("auth initialized, releasing queued requests");
                    self.phase.set(AuthPhase::Ready);
                    return Ok(());
                }
                Err(e) if self.retry.should_retry(attempt) => {
                    warn!("auth initialization attempt {} failed: {}", attempt, e);
                }
                Err(e) => {
                    self.fail(e.clone());
                    return Err(e);
                }
            }
        }
    }

    pub fn fail(&self, error: Error) {
        error!("auth initialization failed: {}", error);
        self.phase.set(AuthPhase::Error(error.to_string()));
    }

    async fn restore_session<P>(&self, provider: &P) -> Result<()>
    where
        P: AuthProvider + ?Sized,
    {
        match provider.get_session().await? {
            Some(provider_session) => {
                let role = self.lookup_role(provider, &provider_session).await;
                self.store_session(provider_session, role)?;
            }
            None => {
                debug!("no provider session");
                self.session.set(None);
                self.store.clear()?;
            }
        }

        Ok(())
    }

    /// Lookup failures are logged and treated as a member
    async fn lookup_role<P>(&self, provider: &P, session: &ProviderSession) -> Role
    where
        P: AuthProvider + ?Sized,
    {
        match provider.fetch_role(session).await {
            Ok(role) => Role::from_profile(role.as_deref()),
            Err(e) => {
                error!("profile fetch error: {}", e);
                Role::Member
            }
        }
    }

    fn store_session(&self, provider_session: ProviderSession, role: Role) -> Result<Session> {
        let session = Session {
            user_id: provider_session.user_id,
            tokens: provider_session.tokens,
            role,
        };
        self.store.save(&session)?;
        self.session.set(Some(session.clone()));

        Ok(session)
    }

    pub async fn sign_in<P>(&self, provider: &P, email: &str, password: &str) -> Result<Session>
    where
        P: AuthProvider + ?Sized,
    {
        let provider_session = provider.sign_in_with_password(email, password).await?;
        let role = self.lookup_role(provider, &provider_session).await;
        let session = self.store_session(provider_session, role)?;
        info!("signed in as {:?}", session.role);

        Ok(session)
    }

    pub async fn sign_up<P>(&self, provider: &P, email: &str, password: &str) -> Result<()>
    where
        P: AuthProvider + ?Sized,
    {
        provider.sign_up(email, password).await
    }

    pub fn clear(&self) -> Result<()> {
        self.session.set(None);
        self.store.clear()
    }
}

/// Message for an auth toast, the provider's own text when it has one
pub fn auth_error_message(error: &Error) -> String {
    match error {
        Error::Provider(message) if !message.trim().is_empty() => message.clone(),
        Error::Provider(_) => AUTH_FAILED_MESSAGE.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    #[default]
    SignIn,
    SignUp,
}

impl LoginMode {
    pub fn toggled(&self) -> Self {
        match self {
            LoginMode::SignIn => LoginMode::SignUp,
            LoginMode::SignUp => LoginMode::SignIn,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            LoginMode::SignIn => "Log in",
            LoginMode::SignUp => "Create Account",
        }
    }

    pub fn submit_label(&self, is_loading: bool) -> &'static str {
        match (is_loading, self) {
            (true, _) => "Processing...",
            (false, LoginMode::SignIn) => "Log in",
            (false, LoginMode::SignUp) => "Sign Up",
        }
    }

    pub fn toggle_label(&self) -> &'static str {
        match self {
            LoginMode::SignIn => "Need an account? Sign Up",
            LoginMode::SignUp => "Already have an account? Log In",
        }
    }
}

/// Submit stays disabled while loading or when both fields are empty
pub fn can_submit(is_loading: bool, email: &str, password: &str) -> bool {
    !is_loading && !(email.is_empty() && password.is_empty())
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};

    use futures::executor::block_on;
    use futures::FutureExt;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        session: RefCell<Option<Session>>,
    }

    impl SessionStore for MemoryStore {
        fn load(&self) -> Option<Session> {
            self.session.borrow().clone()
        }

        fn save(&self, session: &Session) -> Result<()> {
            *self.session.borrow_mut() = Some(session.clone());
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            *self.session.borrow_mut() = None;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockProvider {
        session: Option<ProviderSession>,
        role: Option<String>,
        role_fails: bool,
        failures_before_success: Cell<u32>,
        get_session_calls: Cell<u32>,
    }

    fn provider_session() -> ProviderSession {
        ProviderSession {
            user_id: "user-1".to_string(),
            tokens: Tokens {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
            },
        }
    }

    #[async_trait(?Send)]
    impl AuthProvider for MockProvider {
        async fn get_session(&self) -> Result<Option<ProviderSession>> {
            self.get_session_calls.set(self.get_session_calls.get() + 1);
            if self.failures_before_success.get() > 0 {
                self.failures_before_success
                    .set(self.failures_before_success.get() - 1);
                return Err(Error::Provider("network down".to_string()));
            }
            Ok(self.session.clone())
        }

        async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession> {
            if email == "reader@example.com" && password == "secret" {
                Ok(provider_session())
            } else {
                Err(Error::Provider("Invalid login credentials".to_string()))
            }
        }

        async fn sign_up(&self, _email: &str, _password: &str) -> Result<()> {
            Err(Error::Provider("".to_string()))
        }

        async fn fetch_role(&self, _session: &ProviderSession) -> Result<Option<String>> {
            if self.role_fails {
                return Err(Error::Provider("profiles unavailable".to_string()));
            }
            Ok(self.role.clone())
        }
    }

    fn manager(store: Rc<MemoryStore>) -> AuthManager {
        AuthManager::new(
            store,
            RetryPolicy {
                max_attempts: 2,
                timeout_ms: 100,
            },
        )
    }

    #[test]
    fn test_initialize_with_admin_session() {
        let store = Rc::new(MemoryStore::default());
        let auth = manager(store.clone());
        let provider = MockProvider {
            session: Some(provider_session()),
            role: Some("admin".to_string()),
            ..Default::default()
        };

        assert!(block_on(auth.initialize(&provider)).is_ok());
        assert_eq!(auth.phase(), AuthPhase::Ready);
        assert_eq!(auth.subject().role, Role::Admin);
        assert_eq!(auth.authorization_header().as_deref(), Some("Bearer access"));
        assert_eq!(store.load().map(|s| s.role), Some(Role::Admin));
    }

    #[test]
    fn test_profile_failure_defaults_to_member() {
        let auth = manager(Rc::new(MemoryStore::default()));
        let provider = MockProvider {
            session: Some(provider_session()),
            role: Some("admin".to_string()),
            role_fails: true,
            ..Default::default()
        };

        assert!(block_on(auth.initialize(&provider)).is_ok());
        assert!(auth.is_authenticated());
        assert_eq!(auth.subject().role, Role::Member);
    }

    #[test]
    fn test_initialize_without_session() {
        let auth = manager(Rc::new(MemoryStore::default()));
        let provider = MockProvider::default();

        assert!(block_on(auth.initialize(&provider)).is_ok());
        assert_eq!(auth.phase(), AuthPhase::Ready);
        assert!(!auth.is_authenticated());
        assert_eq!(auth.authorization_header(), None);
    }

    #[test]
    fn test_requests_wait_for_initialization() {
        let auth = manager(Rc::new(MemoryStore::default()));
        auth.set_auth_required(true);

        assert!(auth.wait_until_settled().now_or_never().is_none());

        let provider = MockProvider::default();
        block_on(async {
            let (result, ()) = futures::join!(auth.initialize(&provider), auth.wait_until_settled());
            assert!(result.is_ok());
        });
        assert!(auth.wait_until_settled().now_or_never().is_some());
    }

    #[test]
    fn test_requests_not_held_when_auth_not_required() {
        let auth = manager(Rc::new(MemoryStore::default()));
        auth.set_auth_required(false);

        assert!(auth.wait_until_settled().now_or_never().is_some());
    }

    #[test]
    fn test_retry_then_success() {
        let auth = manager(Rc::new(MemoryStore::default()));
        let provider = MockProvider {
            session: Some(provider_session()),
            failures_before_success: Cell::new(1),
            ..Default::default()
        };

        assert!(block_on(auth.initialize(&provider)).is_ok());
        assert_eq!(provider.get_session_calls.get(), 2);
        assert_eq!(auth.phase(), AuthPhase::Ready);
    }

    #[test]
    fn test_retries_exhausted() {
        let auth = manager(Rc::new(MemoryStore::default()));
        let provider = MockProvider {
            failures_before_success: Cell::new(5),
            ..Default::default()
        };

        let result = block_on(auth.initialize(&provider));
        assert_eq!(result, Err(Error::Provider("network down".to_string())));
        assert_eq!(provider.get_session_calls.get(), 2);
        assert_eq!(auth.phase(), AuthPhase::Error("network down".to_string()));
        // queued requests are released on failure too
        assert!(auth.wait_until_settled().now_or_never().is_some());
    }

    #[test]
    fn test_sign_in_and_clear() {
        let store = Rc::new(MemoryStore::default());
        let auth = manager(store.clone());
        let provider = MockProvider {
            role: Some("user".to_string()),
            ..Default::default()
        };

        let session = block_on(auth.sign_in(&provider, "reader@example.com", "secret")).unwrap();
        assert_eq!(session.role, Role::Member);
        assert!(auth.is_authenticated());

        auth.clear().unwrap();
        assert!(!auth.is_authenticated());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_sign_in_error_message() {
        let auth = manager(Rc::new(MemoryStore::default()));
        let provider = MockProvider::default();

        let err = block_on(auth.sign_in(&provider, "reader@example.com", "wrong")).unwrap_err();
        assert_eq!(auth_error_message(&err), "Invalid login credentials");

        let err = block_on(auth.sign_up(&provider, "reader@example.com", "secret")).unwrap_err();
        assert_eq!(auth_error_message(&err), AUTH_FAILED_MESSAGE);
    }

    #[test]
    fn test_restores_persisted_session() {
        let store = Rc::new(MemoryStore::default());
        store
            .save(&Session {
                user_id: "user-1".to_string(),
                tokens: provider_session().tokens,
                role: Role::Admin,
            })
            .unwrap();

        let auth = manager(store);
        assert!(auth.is_authenticated());
        assert_eq!(auth.subject().role, Role::Admin);
        assert_eq!(auth.phase(), AuthPhase::Unauthenticated);
    }

    #[test]
    fn test_stale_session_dropped_without_provider_session() {
        let store = Rc::new(MemoryStore::default());
        store
            .save(&Session {
                user_id: "user-1".to_string(),
                tokens: provider_session().tokens,
                role: Role::Admin,
            })
            .unwrap();

        let auth = manager(store.clone());
        assert!(block_on(auth.initialize(&MockProvider::default())).is_ok());
        assert!(!auth.is_authenticated());
        assert_eq!(auth.subject().role, Role::Member);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_login_form() {
        assert!(!can_submit(true, "a", "b"));
        assert!(!can_submit(false, "", ""));
        assert!(can_submit(false, "a", ""));
        assert_eq!(LoginMode::SignIn.toggled(), LoginMode::SignUp);
        assert_eq!(LoginMode::SignUp.submit_label(false), "Sign Up");
        assert_eq!(LoginMode::SignIn.submit_label(true), "Processing...");
    }
}
