//! Mock token issuing.
//!
//! Credentials are only checked for presence. The token is opaque and never verified.

use chrono::{Duration, Utc};

use crate::dto::{TokenReq, TokenRes};

/// Lifetime of an issued token.
pub const TOKEN_TTL_SECONDS: i64 = 3600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingCredentials,
}

/// Issues an access token for any non-empty username and password.
pub fn issue_mock_token(req: &TokenReq) -> Result<TokenRes, AuthError> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    if !present(&req.username) || !present(&req.password) {
        return Err(AuthError::MissingCredentials);
    }

    let exp = (Utc::now() + Duration::seconds(TOKEN_TTL_SECONDS)).timestamp();
    Ok(TokenRes {
        access: format!("mock.{}", uuid::Uuid::new_v4().simple()),
        token_type: "access".into(),
        exp,
    })
}
