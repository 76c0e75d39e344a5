use axum::http::HeaderMap;

use crate::core::errors::ApiError;

const USER_ID_HEADER: &str = "x-user-id";

/// Every API route is scoped to a caller. Requests without an
/// identifying header are rejected.
pub fn require_user(headers: &HeaderMap) -> Result<String, ApiError> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or("");

    if user_id.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    Ok(user_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn require_user_accepts_a_user_header() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("alice"));

        let result = require_user(&headers);

        assert_eq!(result.unwrap(), "alice");
    }

    #[test]
    fn require_user_trims_surrounding_whitespace() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  bob  "));

        assert_eq!(require_user(&headers).unwrap(), "bob");
    }

    #[test]
    fn require_user_rejects_missing_or_blank_header() {
        let missing = require_user(&HeaderMap::new());
        assert!(matches!(missing, Err(ApiError::Unauthorized)));

        let mut blank_headers = HeaderMap::new();
        blank_headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        let blank = require_user(&blank_headers);
        assert!(matches!(blank, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn require_user_rejects_non_utf8_header_value() {
        let mut headers = HeaderMap::new();
        let non_utf8 = HeaderValue::from_bytes(&[0xFF, 0xFE, 0xFD])
            .expect("header value bytes should be accepted");
        headers.insert(USER_ID_HEADER, non_utf8);

        let result = require_user(&headers);

        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }
}
