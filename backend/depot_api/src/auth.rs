//! Caller identity.
//!
//! Authentication happens upstream: the gateway in front of this service
//! verifies the session and forwards the user id in [`USER_HEADER`]. Handlers
//! take an [`AuthUser`] argument and pass its id down to every query.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::api::ApiState;
use crate::errors::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated owner of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match id {
            Some(id) => Ok(AuthUser { id: id.to_string() }),
            None => {
                debug!("Rejecting {} {}: no {USER_HEADER}", parts.method, parts.uri);
                Err(ApiError::Unauthenticated {
                    login_url: state.login_url.clone(),
                })
            }
        }
    }
}
