//! Per-request identity, threaded explicitly into every domain operation
//! that needs it. Supplied by the auth collaborator at the HTTP boundary;
//! the core never reads ambient session state.

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Authenticated admin user id, when present
    pub user_id: Option<i64>,
    pub is_admin: bool,
    /// Resolved visitor id for token-authenticated guests
    pub visitor_id: Option<i64>,
    /// Session was established through a guest access token
    pub token_session: bool,
}

impl RequestContext {
    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin: true,
            visitor_id: None,
            token_session: false,
        }
    }

    pub fn visitor(visitor_id: i64) -> Self {
        Self {
            user_id: None,
            is_admin: false,
            visitor_id: Some(visitor_id),
            token_session: true,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The admin user id, or an authorization error for everyone else.
    pub fn require_admin(&self) -> DomainResult<i64> {
        match (self.is_admin, self.user_id) {
            (true, Some(id)) => Ok(id),
            _ => Err(DomainError::Authorization(
                "Apenas administradores podem executar esta operação".to_string(),
            )),
        }
    }
}
