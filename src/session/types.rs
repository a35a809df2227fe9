use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure containing session information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub session_id: String,
    pub user_id: Uuid,
    pub username: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// The authenticated user behind a request
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub username: String,
    pub session_id: String,
}

impl From<SessionClaims> for CurrentUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            session_id: claims.session_id,
        }
    }
}

/// Per-request session state, attached by the session middleware.
/// Anonymous requests carry `user: None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub user: Option<CurrentUser>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(user: CurrentUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
