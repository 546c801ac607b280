//! Pure decoding of the backend response envelope
//!
//! Every backend response body has the shape
//! `{ "code": number, "data": T, "errMessage": string|null, "isSuccess": bool }`.
//! This module contains zero I/O: the shell hands over the status line, the
//! content length and the body bytes, and gets back either the bare `data`
//! value or a classified [`ApiError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Envelope `code` values that count as success.
pub const SUCCESS_CODES: [i64; 3] = [200, 0, 201];

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

/// The wire envelope wrapping every backend response
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, rename = "errMessage")]
    pub err_message: Option<String>,
    #[serde(default, rename = "isSuccess")]
    pub is_success: bool,
}

impl<T> Envelope<T> {
    /// `isSuccess` is true and `code` is one of [`SUCCESS_CODES`].
    pub fn is_ok(&self) -> bool {
        self.is_success && SUCCESS_CODES.contains(&self.code)
    }
}

impl Envelope<Value> {
    /// Unwrap the envelope, dropping the wrapper on success.
    ///
    /// A JSON `null` payload is reported as `None`, same as an absent one.
    pub fn into_result(self, status: u16, status_text: Option<&str>) -> Result<Option<Value>, ApiError> {
        if self.is_ok() {
            return Ok(self.data.filter(|d| !d.is_null()));
        }

        let message = ApiError::pick_message(status, self.err_message.as_deref(), status_text);
        Err(ApiError::from_status(status, message, self.data))
    }
}

// ============================================================================
// Pure Transformation Functions
// ============================================================================

/// Whether a response should be treated as having no body.
///
/// `content_length` is the raw `Content-Length` header value, if any.
pub fn is_no_content(status: u16, content_length: Option<&str>) -> bool {
    status == 204 || content_length.map(str::trim) == Some("0")
}

/// Decode a raw backend response into its `data` payload.
///
/// # Arguments
/// * `status` - HTTP status code
/// * `status_text` - Canonical reason phrase for the status, if known
/// * `no_content` - Result of [`is_no_content`]; the body is not parsed when set
/// * `body` - Raw response body
///
/// # Returns
/// * `Ok(None)` - Empty response, or a success envelope with no data
/// * `Ok(Some(data))` - A success envelope's `data`
/// * `Err(ApiError)` - A failed envelope or a body that is not an envelope,
///   classified by HTTP status
pub fn decode_response(
    status: u16,
    status_text: Option<&str>,
    no_content: bool,
    body: &[u8],
) -> Result<Option<Value>, ApiError> {
    if no_content {
        return Ok(None);
    }

    let envelope: Envelope<Value> = serde_json::from_slice(body).map_err(|e| {
        let reason = status_text.unwrap_or("Unknown status");
        ApiError::from_status(
            status,
            format!("Failed to parse response body (HTTP {status} {reason}): {e}"),
            None,
        )
    })?;

    envelope.into_result(status, status_text)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_success_returns_data_only() {
        let raw = body(json!({
            "code": 200,
            "data": {"id": 7, "title": "三体"},
            "errMessage": null,
            "isSuccess": true
        }));

        let data = decode_response(200, Some("OK"), false, &raw).unwrap();

        assert_eq!(data, Some(json!({"id": 7, "title": "三体"})));
    }

    #[test]
    fn test_all_success_codes_accepted() {
        for code in SUCCESS_CODES {
            let raw = body(json!({"code": code, "data": [1, 2], "isSuccess": true}));
            let data = decode_response(200, Some("OK"), false, &raw).unwrap();
            assert_eq!(data, Some(json!([1, 2])), "code {code}");
        }
    }

    #[test]
    fn test_null_data_is_none() {
        let raw = body(json!({"code": 200, "data": null, "errMessage": null, "isSuccess": true}));
        assert_eq!(decode_response(200, Some("OK"), false, &raw).unwrap(), None);

        let raw = body(json!({"code": 0, "isSuccess": true}));
        assert_eq!(decode_response(200, Some("OK"), false, &raw).unwrap(), None);
    }

    #[test]
    fn test_is_success_false_is_error_even_with_good_code() {
        let raw = body(json!({
            "code": 200,
            "data": {"field": "username"},
            "errMessage": "用户名已存在",
            "isSuccess": false
        }));

        let err = decode_response(200, Some("OK"), false, &raw).unwrap_err();

        assert_eq!(err.status(), 200);
        assert_eq!(err.message(), "用户名已存在");
        assert_eq!(err.data(), Some(&json!({"field": "username"})));
    }

    #[test]
    fn test_unexpected_code_is_error_even_with_is_success() {
        let raw = body(json!({"code": 500, "data": null, "isSuccess": true}));

        let err = decode_response(200, Some("OK"), false, &raw).unwrap_err();

        assert!(matches!(err, ApiError::Api { status: 200, .. }));
        assert_eq!(err.message(), "OK");
    }

    #[test]
    fn test_error_kind_follows_http_status() {
        let raw = body(json!({"code": 401, "errMessage": "请先登录", "isSuccess": false}));
        let err = decode_response(401, Some("Unauthorized"), false, &raw).unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(err.message(), "请先登录");

        let raw = body(json!({"code": 404, "errMessage": null, "isSuccess": false}));
        let err = decode_response(404, Some("Not Found"), false, &raw).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Not Found");

        let raw = body(json!({"code": 500, "errMessage": null, "isSuccess": false}));
        let err = decode_response(500, None, false, &raw).unwrap_err();
        assert_eq!(err.status(), 500);
        assert_eq!(err.message(), "An API error occurred");
    }

    #[test]
    fn test_no_content_skips_parsing() {
        assert_eq!(decode_response(204, None, true, b"").unwrap(), None);
        assert_eq!(decode_response(200, Some("OK"), true, b"not json").unwrap(), None);
    }

    #[test]
    fn test_malformed_json_is_generic_error_with_status() {
        let err = decode_response(200, Some("OK"), false, b"<html>oops</html>").unwrap_err();

        assert!(matches!(err, ApiError::Api { status: 200, .. }));
        assert!(err.message().contains("HTTP 200"));
        assert_eq!(err.data(), None);
    }

    #[test]
    fn test_non_envelope_json_is_error() {
        let raw = body(json!({"timestamp": "2024-01-01", "status": 500, "error": "Internal"}));

        let err = decode_response(500, Some("Internal Server Error"), false, &raw).unwrap_err();

        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_is_no_content() {
        assert!(is_no_content(204, None));
        assert!(is_no_content(200, Some("0")));
        assert!(is_no_content(200, Some(" 0 ")));
        assert!(!is_no_content(200, Some("12")));
        assert!(!is_no_content(200, None));
    }

    #[test]
    fn test_envelope_is_ok() {
        let env: Envelope<Value> = Envelope {
            code: 201,
            data: None,
            err_message: None,
            is_success: true,
        };
        assert!(env.is_ok());

        let env: Envelope<Value> = Envelope {
            code: 201,
            data: None,
            err_message: None,
            is_success: false,
        };
        assert!(!env.is_ok());
    }
}
