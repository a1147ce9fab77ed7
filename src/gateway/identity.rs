//! Caller identity from trusted upstream headers
//!
//! The identity collaborator in front of the gateway authenticates the
//! request and forwards the result:
//!
//! - `X-User-Id` (required, numeric)
//! - `X-User-Role` (`ADMIN` or `USER`, default `USER`)
//! - `X-User-Email` (audit principal, defaults to `user-<id>`)
//! - `X-Forwarded-For` (first hop is the origin address)

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use super::types::ApiError;
use crate::identity::{CallerIdentity, Role};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Build the caller from request headers
pub fn caller_from_headers(headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
    let user_id: i64 = header(headers, USER_ID_HEADER)
        .ok_or_else(|| ApiError::unauthorized("Missing caller identity"))?
        .parse()
        .map_err(|_| ApiError::unauthorized("Invalid caller identity"))?;

    let role = match header(headers, USER_ROLE_HEADER) {
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|_| ApiError::unauthorized("Invalid caller role"))?,
        None => Role::User,
    };

    let principal = header(headers, USER_EMAIL_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| format!("user-{}", user_id));

    let mut caller = match role {
        Role::Admin => CallerIdentity::admin(user_id, principal),
        Role::User => CallerIdentity::user(user_id, principal),
    };

    if let Some(first_hop) = header(headers, FORWARDED_FOR_HEADER)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        caller = caller.with_origin(first_hop);
    }

    Ok(caller)
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_full_identity() {
        let caller = caller_from_headers(&headers(&[
            (USER_ID_HEADER, "7"),
            (USER_ROLE_HEADER, "admin"),
            (USER_EMAIL_HEADER, "ops@example.com"),
            (FORWARDED_FOR_HEADER, "203.0.113.9, 10.0.0.1"),
        ]))
        .unwrap();
        assert_eq!(caller.user_id, 7);
        assert!(caller.is_admin());
        assert_eq!(caller.principal, "ops@example.com");
        assert_eq!(caller.origin.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_defaults() {
        let caller = caller_from_headers(&headers(&[(USER_ID_HEADER, "3")])).unwrap();
        assert_eq!(caller.role, Role::User);
        assert_eq!(caller.principal, "user-3");
        assert_eq!(caller.origin, None);
    }

    #[test]
    fn test_missing_or_invalid_is_unauthorized() {
        for map in [
            headers(&[]),
            headers(&[(USER_ID_HEADER, "abc")]),
            headers(&[(USER_ID_HEADER, "1"), (USER_ROLE_HEADER, "root")]),
        ] {
            let err = caller_from_headers(&map).unwrap_err();
            assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        }
    }
}
