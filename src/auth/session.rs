//! Session tokens for Corkboard.
//!
//! A session is a signed JWT carried in a cookie (or a Bearer header).
//! Claims include the user's identity and role names so that request
//! handling does not need a user lookup. Sessions slide: a token older
//! than half its lifetime is reissued on use.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::role::ROLE_ADMIN;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "corkboard_session";

/// Session-related errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Token could not be encoded.
    #[error("failed to issue session token: {0}")]
    Encode(String),

    /// Token is missing, malformed, expired, or badly signed.
    #[error("invalid or expired session")]
    Invalid,
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID).
    pub sub: i64,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Role names held at login time.
    pub roles: Vec<String>,
    /// Issued at (unix seconds).
    pub iat: u64,
    /// Expiration (unix seconds).
    pub exp: u64,
    /// Token ID.
    pub jti: String,
}

impl SessionClaims {
    /// True when the session belongs to a full administrator.
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// True when the session carries the named role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    /// Session lifetime in seconds.
    lifetime_secs: u64,
}

impl SessionKeys {
    /// Create session keys from the shared secret.
    pub fn new(secret: &str, lifetime_days: i64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime_secs: (lifetime_days.max(1) as u64) * 24 * 60 * 60,
        }
    }

    /// Session lifetime in seconds.
    pub fn lifetime_secs(&self) -> u64 {
        self.lifetime_secs
    }

    /// Issue a token for the given identity and roles.
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        email: &str,
        display_name: &str,
        roles: Vec<String>,
    ) -> Result<String, SessionError> {
        let now = unix_now();
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            roles,
            iat: now,
            exp: now + self.lifetime_secs,
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Encode(e.to_string()))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| SessionError::Invalid)
    }

    /// True when the token is past half its lifetime and should be
    /// reissued to keep the session sliding.
    pub fn needs_refresh(&self, claims: &SessionClaims) -> bool {
        unix_now().saturating_sub(claims.iat) > self.lifetime_secs / 2
    }

    /// Reissue a token carrying the same identity with a fresh window.
    pub fn refresh(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        self.issue(
            claims.sub,
            &claims.username,
            &claims.email,
            &claims.display_name,
            claims.roles.clone(),
        )
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
