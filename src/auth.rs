//! HTTP Basic authentication and the admin guard.

use crate::error::AppError;
use crate::membership::{MembershipService, UserDetails};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

pub const ADMIN_AUTHORITY: &str = "ROLE_ADMIN";

#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Parse an `Authorization: Basic <base64(username:password)>` header value.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let encoded = value
            .strip_prefix("Basic ")
            .or_else(|| value.strip_prefix("basic "))
            .ok_or_else(|| AppError::Unauthorized("basic authentication required".into()))?;
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| AppError::Unauthorized("malformed basic credentials".into()))?;
        let decoded =
            String::from_utf8(decoded).map_err(|_| AppError::Unauthorized("malformed basic credentials".into()))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AppError::Unauthorized("malformed basic credentials".into()))?;
        Ok(BasicCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("basic authentication required".into()))?;
        Self::parse(value)
    }
}

/// Middleware: authenticates the caller and requires `ROLE_ADMIN`.
/// The authenticated `UserDetails` are added to the request extensions.
pub async fn require_admin(
    State(membership): State<Arc<MembershipService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = BasicCredentials::from_headers(request.headers())?;
    let details: UserDetails = membership
        .authenticate(&credentials.username, &credentials.password)
        .await?;
    if !details.has_authority(ADMIN_AUTHORITY) {
        tracing::warn!(username = %details.username, "admin route refused");
        return Err(AppError::Forbidden("administrator permission required".into()));
    }
    request.extensions_mut().insert(details);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn parses_basic_credentials() {
        let c = BasicCredentials::parse(&header("john:pa:ss")).unwrap();
        assert_eq!(c.username, "john");
        assert_eq!(c.password, "pa:ss");
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(matches!(BasicCredentials::parse("Bearer abc"), Err(AppError::Unauthorized(_))));
        assert!(BasicCredentials::parse("Basic !!!").is_err());
        assert!(BasicCredentials::parse(&header("no-colon")).is_err());
    }

    #[test]
    fn missing_header_is_unauthorized() {
        assert!(matches!(
            BasicCredentials::from_headers(&HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));
    }
}
