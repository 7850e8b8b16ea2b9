use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::Arc;

use super::{ApiError, AppState};

// ============================================================================
// Middleware
// ============================================================================

/// Rejects the request with 401 unless it carries valid HTTP Basic credentials
/// for the configured admin. Runs before any protected handler.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some((username, password)) = extract_basic_credentials(request.headers()) else {
        return Err(ApiError::unauthorized());
    };

    let principal = state
        .auth_service
        .authenticate(&username, &password)
        .await
        .inspect_err(|_| tracing::debug!(username = %username, "Basic authentication failed"))?;

    tracing::Span::current().record("user_id", principal.as_str());
    Ok(next.run(request).await)
}

// ============================================================================
// Helpers
// ============================================================================

/// Decode `Authorization: Basic <base64(user:pass)>`.
///
/// The scheme name is matched case-insensitively. The password may itself
/// contain colons; only the first one separates it from the username.
pub fn extract_basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extracts_admin_credentials() {
        // admin:admin
        let creds = extract_basic_credentials(&headers_with("Basic YWRtaW46YWRtaW4="));
        assert_eq!(creds, Some(("admin".to_string(), "admin".to_string())));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let creds = extract_basic_credentials(&headers_with("basic YWRtaW46YWRtaW4="));
        assert!(creds.is_some());
    }

    #[test]
    fn test_password_may_contain_colons() {
        let encoded = STANDARD.encode("admin:a:b:c");
        let creds = extract_basic_credentials(&headers_with(&format!("Basic {encoded}")));
        assert_eq!(creds, Some(("admin".to_string(), "a:b:c".to_string())));
    }

    #[test]
    fn test_rejects_malformed_headers() {
        assert!(extract_basic_credentials(&HeaderMap::new()).is_none());
        assert!(extract_basic_credentials(&headers_with("Bearer YWRtaW46YWRtaW4=")).is_none());
        assert!(extract_basic_credentials(&headers_with("Basic !!!not-base64")).is_none());
        assert!(extract_basic_credentials(&headers_with("Basic")).is_none());

        let no_colon = STANDARD.encode("adminadmin");
        assert!(extract_basic_credentials(&headers_with(&format!("Basic {no_colon}"))).is_none());
    }
}
