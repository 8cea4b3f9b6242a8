//! Request extractors.

use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use checkout::{Identity, UserId};

use crate::error::ApiError;

/// Header set by the authentication gateway for logged-in users.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's identity. A missing header means an anonymous visitor.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Caller(Identity::Anonymous));
        };

        let raw = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{USER_ID_HEADER} is not valid text")))?;
        let user = UserId::from_str(raw.trim())
            .map_err(|e| ApiError::BadRequest(format!("Invalid {USER_ID_HEADER}: {e}")))?;

        Ok(Caller(Identity::User(user)))
    }
}

/// Parses a UUID-backed path segment.
pub fn parse_id<T: FromStr<Err = uuid::Error>>(kind: &str, raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {kind} ID format: {e}")))
}
