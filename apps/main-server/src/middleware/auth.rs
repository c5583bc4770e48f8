//! Authentication middleware.

use std::sync::Arc;

use auth::{AuthenticatedUser, JwtManager};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use deal_store::DealStore;

use crate::state::AppState;

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE_NAME: &str = "cd_session";

/// Extracts the session token from the Authorization header, falling back to
/// the session cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Validates a token, returning the session user.
fn authenticate(jwt_manager: &JwtManager, token: &str) -> Option<AuthenticatedUser> {
    match jwt_manager.validate_token(token) {
        Ok(claims) => Some(claims.user()),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid session token");
            None
        }
    }
}

/// Optional authentication middleware.
///
/// Stores the session user in the request extensions when a valid token is
/// present. Requests without one continue anonymously; handlers that need a
/// session reject them with `AuthenticationRequired`.
pub async fn optional_auth_middleware<S: DealStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(jwt_manager) = &state.jwt_manager else {
        return next.run(request).await;
    };

    if let Some(token) = extract_token(request.headers()) {
        if let Some(user) = authenticate(jwt_manager, &token) {
            request.extensions_mut().insert(user);
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use auth::JwtConfig;
    use axum::http::{HeaderValue, header::COOKIE};

    use super::*;

    #[test]
    fn test_extract_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer test-token-123"));
        assert_eq!(extract_token(&headers).as_deref(), Some("test-token-123"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("cd_anon_id=abc; cd_session=jwt-value"));
        assert_eq!(extract_token(&headers).as_deref(), Some("jwt-value"));
    }

    #[test]
    fn test_extract_token_ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic credentials"));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn test_authenticate_round_trip() {
        let manager = JwtManager::new(JwtConfig::new("middleware-test-secret")).unwrap();
        let user = AuthenticatedUser::new("acct-9").with_email("nine@example.com");
        let token = manager.generate_token(&user).unwrap();

        assert_eq!(authenticate(&manager, &token), Some(user));
        assert_eq!(authenticate(&manager, "garbage"), None);
    }
}
