//! Authentication and authorization for Corkboard.
//!
//! Covers password hashing and policy, login rate limiting, session
//! tokens, the registration/login service, and role membership.

pub mod password;
pub mod rate_limit;
pub mod roles;
pub mod service;
pub mod session;

pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use rate_limit::{FailureOutcome, LoginGate, LoginLimiter, MemoryCache, TtlCache};
pub use roles::RoleService;
pub use service::{AuthService, LoginDenied, LoginResult, LoginSuccess};
pub use session::{SessionClaims, SessionError, SessionKeys, SESSION_COOKIE};
