/// Authentication utilities
///
/// DreamPip does not run its own login flow. The identity provider issues
/// signed session tokens; this module verifies them and turns them into an
/// [`context::AuthContext`] for request handlers.
///
/// # Modules
///
/// - [`jwt`]: HS256 session token creation and validation
/// - [`context`]: Per-request identity and `Authorization` header parsing

pub mod context;
pub mod jwt;
