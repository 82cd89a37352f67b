//! Authentication service: registration and rate-limited login.

use std::time::Duration;

use tracing::{info, warn};

use super::password::{hash_password, validate_password};
use super::rate_limit::{FailureOutcome, LoginGate, LoginLimiter, MemoryCache};
use super::session::SessionKeys;
use crate::config::AuthConfig;
use crate::db::role::ROLE_USER;
use crate::db::role_repository::RoleRepository;
use crate::db::user::{NewUser, User};
use crate::db::user_repository::UserRepository;
use crate::{BoardError, Result};

/// A refused login, with enough detail for the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginDenied {
    /// The username and address pair is currently locked out.
    Locked { minutes: u64 },
    /// This attempt triggered a lockout.
    LockedNow { minutes: u64 },
    /// Wrong username or password.
    InvalidCredentials { remaining: u32 },
}

impl LoginDenied {
    pub fn message(&self) -> String {
        match self {
            LoginDenied::Locked { minutes } => {
                format!("Account locked. Try again in {} minutes.", minutes)
            }
            LoginDenied::LockedNow { minutes } => format!(
                "Too many failed attempts. Account locked for {} minutes.",
                minutes
            ),
            LoginDenied::InvalidCredentials { remaining } => format!(
                "Invalid username or password. {} attempts remaining.",
                remaining
            ),
        }
    }
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    /// Signed session token.
    pub token: String,
    /// The authenticated user.
    pub user: User,
    /// Role names held by the user.
    pub roles: Vec<String>,
}

/// Outcome of a login attempt. Database failures surface as errors;
/// refused logins are an ordinary outcome.
pub type LoginResult = std::result::Result<LoginSuccess, LoginDenied>;

/// Registration and login against the user store.
pub struct AuthService {
    users: UserRepository,
    roles: RoleRepository,
    limiter: LoginLimiter<MemoryCache>,
    keys: SessionKeys,
}

impl AuthService {
    pub fn new(users: UserRepository, roles: RoleRepository, config: &AuthConfig) -> Self {
        let window = Duration::from_secs(config.lockout_minutes * 60);
        Self {
            users,
            roles,
            limiter: LoginLimiter::new(
                MemoryCache::new(),
                config.max_login_attempts,
                window,
                window,
            ),
            keys: SessionKeys::new(&config.session_secret, config.session_days),
        }
    }

    /// Session keys, for verifying tokens at the web layer.
    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    /// Register a new user with the default role.
    ///
    /// Returns `None` when the username or email is already taken.
    /// Registration never logs the user in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<User>> {
        validate_password(password).map_err(|e| BoardError::Validation(e.to_string()))?;

        let hashed =
            hash_password(password).map_err(|e| BoardError::Auth(e.to_string()))?;
        let new_user = NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: hashed,
            display_name: display_name.to_string(),
        };

        let user = match self.users.create(&new_user).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        self.roles.assign(user.id, ROLE_USER).await?;
        info!("registered user {} ({})", user.username, user.id);
        Ok(Some(user))
    }

    /// Attempt to log in.
    ///
    /// Failed attempts are counted per username and client address
    /// pair; too many failures lock the pair out. A successful login
    /// clears the pair's history and returns a signed session token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client_ip: &str,
    ) -> Result<LoginResult> {
        if let LoginGate::Locked { minutes_remaining } = self.limiter.check(username, client_ip)
        {
            warn!("login for {} from {} refused: locked out", username, client_ip);
            return Ok(Err(LoginDenied::Locked {
                minutes: minutes_remaining,
            }));
        }

        // Deactivated accounts fail exactly like unknown ones: they
        // count toward the limiter and their status is not disclosed
        let user = self
            .users
            .find_by_username(username)
            .await?
            .filter(|u| u.is_active);
        let verified = match &user {
            Some(user) => {
                super::password::verify_password(password, &user.password)
                    .map_err(|e| BoardError::Auth(e.to_string()))?
            }
            None => false,
        };

        if !verified {
            let denied = match self.limiter.record_failure(username, client_ip) {
                FailureOutcome::LockedOut { minutes } => {
                    warn!("login failures locked out {} from {}", username, client_ip);
                    LoginDenied::LockedNow { minutes }
                }
                FailureOutcome::AttemptsRemaining(remaining) => {
                    LoginDenied::InvalidCredentials { remaining }
                }
            };
            return Ok(Err(denied));
        }

        let user = user.expect("verified login has a user");
        self.limiter.record_success(username, client_ip);

        let roles = self.roles.roles_of(user.id).await?;
        let token = self
            .keys
            .issue(
                user.id,
                &user.username,
                &user.email,
                &user.display_name,
                roles.clone(),
            )
            .map_err(|e| BoardError::Auth(e.to_string()))?;

        info!("user {} logged in from {}", user.username, client_ip);
        Ok(Ok(LoginSuccess { token, user, roles }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> (Database, AuthService) {
        let db = Database::open_in_memory().await.unwrap();
        let service = AuthService::new(
            UserRepository::new(db.pool().clone()),
            RoleRepository::new(db.pool().clone()),
            &AuthConfig::default(),
        );
        (db, service)
    }

    #[tokio::test]
    async fn test_register_assigns_default_role() {
        let (db, service) = setup().await;
        let user = service
            .register("alice", "alice@example.com", "Sup3r$ecret", "Alice")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.username, "alice");
        assert!(user.password.starts_with("$argon2id$"));

        let roles = RoleRepository::new(db.pool().clone());
        assert!(roles.has_role(user.id, ROLE_USER).await.unwrap());
    }

    #[tokio::test]
    async fn test_register_duplicate_returns_none() {
        let (_db, service) = setup().await;
        service
            .register("alice", "alice@example.com", "Sup3r$ecret", "Alice")
            .await
            .unwrap()
            .unwrap();

        let dup_name = service
            .register("alice", "other@example.com", "Sup3r$ecret", "Alice 2")
            .await
            .unwrap();
        assert!(dup_name.is_none());

        let dup_email = service
            .register("bob", "alice@example.com", "Sup3r$ecret", "Bob")
            .await
            .unwrap();
        assert!(dup_email.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let (_db, service) = setup().await;
        let result = service
            .register("alice", "alice@example.com", "password", "Alice")
            .await;
        assert!(matches!(result, Err(BoardError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let (_db, service) = setup().await;
        service
            .register("alice", "alice@example.com", "Sup3r$ecret", "Alice")
            .await
            .unwrap()
            .unwrap();

        let success = service
            .login("alice", "Sup3r$ecret", "10.0.0.1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(success.user.username, "alice");
        assert_eq!(success.roles, vec!["User"]);

        let claims = service.keys().verify(&success.token).unwrap();
        assert_eq!(claims.sub, success.user.id);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password_counts_down() {
        let (_db, service) = setup().await;
        service
            .register("alice", "alice@example.com", "Sup3r$ecret", "Alice")
            .await
            .unwrap()
            .unwrap();

        let denied = service
            .login("alice", "wrong", "10.0.0.1")
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(denied, LoginDenied::InvalidCredentials { remaining: 4 });
        assert!(denied.message().contains("4 attempts remaining"));
    }

    #[tokio::test]
    async fn test_login_unknown_user_counts() {
        let (_db, service) = setup().await;
        let denied = service
            .login("ghost", "whatever", "10.0.0.1")
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(denied, LoginDenied::InvalidCredentials { remaining: 4 });
    }

    #[tokio::test]
    async fn test_lockout_after_max_failures() {
        let (_db, service) = setup().await;
        service
            .register("alice", "alice@example.com", "Sup3r$ecret", "Alice")
            .await
            .unwrap()
            .unwrap();

        for _ in 0..4 {
            service.login("alice", "wrong", "10.0.0.1").await.unwrap().unwrap_err();
        }
        let denied = service
            .login("alice", "wrong", "10.0.0.1")
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(denied, LoginDenied::LockedNow { minutes: 15 });

        // Even the correct password is refused while locked out
        let denied = service
            .login("alice", "Sup3r$ecret", "10.0.0.1")
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(denied, LoginDenied::Locked { minutes: 15 });

        // A different address is unaffected
        let success = service
            .login("alice", "Sup3r$ecret", "10.0.0.2")
            .await
            .unwrap();
        assert!(success.is_ok());
    }

    #[tokio::test]
    async fn test_success_resets_counter() {
        let (_db, service) = setup().await;
        service
            .register("alice", "alice@example.com", "Sup3r$ecret", "Alice")
            .await
            .unwrap()
            .unwrap();

        service.login("alice", "wrong", "10.0.0.1").await.unwrap().unwrap_err();
        service.login("alice", "wrong", "10.0.0.1").await.unwrap().unwrap_err();
        service
            .login("alice", "Sup3r$ecret", "10.0.0.1")
            .await
            .unwrap()
            .unwrap();

        let denied = service
            .login("alice", "wrong", "10.0.0.1")
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(denied, LoginDenied::InvalidCredentials { remaining: 4 });
    }

    #[tokio::test]
    async fn test_deactivated_account_fails_like_bad_credentials() {
        let (db, service) = setup().await;
        let user = service
            .register("alice", "alice@example.com", "Sup3r$ecret", "Alice")
            .await
            .unwrap()
            .unwrap();

        let users = UserRepository::new(db.pool().clone());
        users
            .update(
                user.id,
                &crate::db::user::UserUpdate::new().is_active(false),
            )
            .await
            .unwrap();

        // The correct password is refused without disclosing the
        // account's status
        let denied = service
            .login("alice", "Sup3r$ecret", "10.0.0.1")
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(denied, LoginDenied::InvalidCredentials { remaining: 4 });

        // And the attempts keep counting toward the lockout
        for _ in 0..3 {
            service
                .login("alice", "Sup3r$ecret", "10.0.0.1")
                .await
                .unwrap()
                .unwrap_err();
        }
        let denied = service
            .login("alice", "Sup3r$ecret", "10.0.0.1")
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(denied, LoginDenied::LockedNow { minutes: 15 });
    }
}
