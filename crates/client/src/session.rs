//! Explicit authentication session.
//!
//! A session is a value owned by whoever drives the client. Nothing is stored globally;
//! callers that want persistence save and load it themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use api_shared::TokenRes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub access: String,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

impl Session {
    pub fn from_token(username: impl Into<String>, token: TokenRes) -> Self {
        Self {
            username: username.into(),
            access: token.access,
            exp: token.exp,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map_or(true, |exp| exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
