/// Per-request authentication context
///
/// The API's auth middleware validates the bearer token and inserts an
/// `AuthContext` into the request extensions; handlers read it with Axum's
/// `Extension` extractor.

use super::jwt::{validate_token, Claims, JwtError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        AuthContext { user_id: claims.sub }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("Expected Bearer token")]
    InvalidFormat,

    #[error(transparent)]
    InvalidToken(#[from] JwtError),
}

/// Pulls the token out of an `Authorization: Bearer <token>` value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

/// Validates the header value and builds the caller's context
pub fn authenticate(header: Option<&str>, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(header)?;
    let claims = validate_token(token, secret)?;
    Ok(AuthContext::from_claims(&claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert!(matches!(bearer_token(None), Err(AuthError::MissingCredentials)));
        assert!(matches!(bearer_token(Some("Basic abc")), Err(AuthError::InvalidFormat)));
        assert!(matches!(bearer_token(Some("Bearer ")), Err(AuthError::InvalidFormat)));
    }

    #[test]
    fn test_authenticate() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id), SECRET).unwrap();
        let header = format!("Bearer {token}");

        let ctx = authenticate(Some(&header), SECRET).unwrap();
        assert_eq!(ctx.user_id, user_id);

        assert!(matches!(
            authenticate(Some(&header), "wrong-secret-key-at-least-32-bytes"),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
