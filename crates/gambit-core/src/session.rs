//! Session state and admin-area gating
//!
//! The session is a plain value owned by whoever drives the application and
//! passed by reference to code that needs it.

use async_trait::async_trait;
use gambit_types::{AuthUser, SessionUser, UserRole};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{GambitError, Result};

/// Default bound on the start-up session check
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Authentication backend used to resolve a stored token
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// User owning `access_token`, or `None` if the token is no longer valid
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>>;

    /// Role stored on the user's profile
    async fn fetch_role(&self, user_id: &str, access_token: &str) -> Result<UserRole>;
}

/// Sign-in and sign-out notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(SessionUser),
    SignedOut,
}

/// Current authentication state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not yet checked against the backend
    #[default]
    Uninitialized,
    SignedOut,
    SignedIn(SessionUser),
}

impl SessionState {
    /// Resolve the stored token into a session, giving up after `timeout`.
    ///
    /// Failures and timeouts leave the session signed out.
    pub async fn initialize(
        backend: &dyn AuthBackend,
        access_token: Option<&str>,
        timeout: Duration,
    ) -> Self {
        match Self::check(backend, access_token, timeout).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Session check failed: {}", e);
                SessionState::SignedOut
            }
        }
    }

    /// Like [`SessionState::initialize`] but reports why the check failed.
    ///
    /// A rejected token is still `Ok(SignedOut)`; backend failures and
    /// `GambitError::Timeout` are returned as errors.
    pub async fn check(
        backend: &dyn AuthBackend,
        access_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let Some(token) = access_token else {
            debug!("No stored session token");
            return Ok(SessionState::SignedOut);
        };

        let resolved = tokio::time::timeout(timeout, resolve(backend, token))
            .await
            .map_err(|_| {
                GambitError::Timeout(format!("session check gave up after {:?}", timeout))
            })?;

        match resolved? {
            Some(user) => {
                info!("Session restored for {} ({})", user.id, user.role);
                Ok(SessionState::SignedIn(user))
            }
            None => {
                info!("Stored session is no longer valid");
                Ok(SessionState::SignedOut)
            }
        }
    }

    pub fn apply(&mut self, event: AuthEvent) {
        *self = match event {
            AuthEvent::SignedIn(user) => SessionState::SignedIn(user),
            AuthEvent::SignedOut => SessionState::SignedOut,
        };
    }

    /// Drop all session state
    pub fn teardown(&mut self) {
        *self = SessionState::Uninitialized;
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self, SessionState::Uninitialized)
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<UserRole> {
        self.user().map(|u| u.role)
    }
}

async fn resolve(backend: &dyn AuthBackend, token: &str) -> Result<Option<SessionUser>> {
    let Some(user) = backend.current_user(token).await? else {
        return Ok(None);
    };
    let role = backend.fetch_role(&user.id, token).await?;

    Ok(Some(SessionUser {
        id: user.id,
        email: user.email,
        role,
    }))
}

/// Whether the session may enter the admin area
pub fn can_access_admin(session: &SessionState) -> bool {
    session.role().map(|r| r.is_staff()).unwrap_or(false)
}

/// Signed-in staff user, or an error explaining why access is denied
pub fn require_admin(session: &SessionState) -> Result<&SessionUser> {
    match session.user() {
        Some(user) if user.role.is_staff() => Ok(user),
        Some(user) => Err(GambitError::Forbidden(format!(
            "role '{}' cannot access the admin area",
            user.role
        ))),
        None => Err(GambitError::Unauthorized("not signed in".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubBackend {
        role: UserRole,
        delay: Duration,
        fail: bool,
    }

    impl StubBackend {
        fn with_role(role: UserRole) -> Self {
            Self {
                role,
                delay: Duration::ZERO,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl AuthBackend for StubBackend {
        async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(GambitError::backend("auth service unavailable"));
            }
            if access_token != "valid" {
                return Ok(None);
            }
            Ok(Some(AuthUser {
                id: "u-1".to_string(),
                email: Some("arbiter@example.com".to_string()),
            }))
        }

        async fn fetch_role(&self, _user_id: &str, _access_token: &str) -> Result<UserRole> {
            Ok(self.role)
        }
    }

    fn signed_in(role: UserRole) -> SessionState {
        SessionState::SignedIn(SessionUser {
            id: "u-1".to_string(),
            email: None,
            role,
        })
    }

    #[test]
    fn test_admin_predicate() {
        assert!(can_access_admin(&signed_in(UserRole::Admin)));
        assert!(can_access_admin(&signed_in(UserRole::Moderator)));
        assert!(!can_access_admin(&signed_in(UserRole::User)));
        assert!(!can_access_admin(&SessionState::SignedOut));
        assert!(!can_access_admin(&SessionState::Uninitialized));
    }

    #[test]
    fn test_require_admin_errors() {
        assert!(require_admin(&signed_in(UserRole::Moderator)).is_ok());
        assert!(matches!(
            require_admin(&signed_in(UserRole::User)),
            Err(GambitError::Forbidden(_))
        ));
        assert!(matches!(
            require_admin(&SessionState::SignedOut),
            Err(GambitError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_initialize_resolves_role() {
        let backend = StubBackend::with_role(UserRole::Moderator);
        let session =
            SessionState::initialize(&backend, Some("valid"), DEFAULT_SESSION_TIMEOUT).await;

        let user = session.user().unwrap();
        assert_eq!(user.email.as_deref(), Some("arbiter@example.com"));
        assert_eq!(session.role(), Some(UserRole::Moderator));
    }

    #[tokio::test]
    async fn test_initialize_without_token_or_with_stale_token() {
        let backend = StubBackend::with_role(UserRole::Admin);

        let session = SessionState::initialize(&backend, None, DEFAULT_SESSION_TIMEOUT).await;
        assert_eq!(session, SessionState::SignedOut);

        let session =
            SessionState::initialize(&backend, Some("expired"), DEFAULT_SESSION_TIMEOUT).await;
        assert_eq!(session, SessionState::SignedOut);
        assert!(session.is_initialized());
    }

    #[tokio::test]
    async fn test_initialize_failure_and_timeout_sign_out() {
        let backend = StubBackend {
            fail: true,
            ..StubBackend::with_role(UserRole::Admin)
        };
        let session =
            SessionState::initialize(&backend, Some("valid"), DEFAULT_SESSION_TIMEOUT).await;
        assert_eq!(session, SessionState::SignedOut);

        let backend = StubBackend {
            delay: Duration::from_secs(60),
            ..StubBackend::with_role(UserRole::Admin)
        };
        let session =
            SessionState::initialize(&backend, Some("valid"), Duration::from_millis(20)).await;
        assert_eq!(session, SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_check_reports_timeout_and_failure() {
        let slow = StubBackend {
            delay: Duration::from_secs(60),
            ..StubBackend::with_role(UserRole::Admin)
        };
        let err = SessionState::check(&slow, Some("valid"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, GambitError::Timeout(_)));

        let broken = StubBackend {
            fail: true,
            ..StubBackend::with_role(UserRole::Admin)
        };
        let err = SessionState::check(&broken, Some("valid"), DEFAULT_SESSION_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, GambitError::Backend { .. }));

        let session = SessionState::check(&broken, None, DEFAULT_SESSION_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(session, SessionState::SignedOut);
    }

    #[test]
    fn test_events_and_teardown() {
        let mut session = SessionState::default();
        assert!(!session.is_initialized());

        session.apply(AuthEvent::SignedIn(SessionUser {
            id: "u-2".to_string(),
            email: None,
            role: UserRole::Admin,
        }));
        assert!(can_access_admin(&session));

        session.apply(AuthEvent::SignedOut);
        assert_eq!(session.user(), None);

        session.teardown();
        assert_eq!(session, SessionState::Uninitialized);
    }
}
