//! Error taxonomy for backend responses
//!
//! Every failed response is classified by its HTTP status: 401 becomes
//! [`ApiError::Authentication`], 404 becomes [`ApiError::NotFound`] and
//! anything else becomes the generic [`ApiError::Api`].

use serde_json::Value;

pub const DEFAULT_AUTHENTICATION_MESSAGE: &str = "Authentication failed";
pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "Resource not found";
pub const DEFAULT_API_MESSAGE: &str = "An API error occurred";

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("{message}")]
    Authentication {
        message: String,
        data: Option<Value>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        data: Option<Value>,
    },

    #[error("{message}")]
    Api {
        message: String,
        status: u16,
        data: Option<Value>,
    },
}

impl ApiError {
    /// Build the error kind that matches `status`.
    pub fn from_status(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        let message = message.into();
        match status {
            401 => ApiError::Authentication { message, data },
            404 => ApiError::NotFound { message, data },
            _ => ApiError::Api {
                message,
                status,
                data,
            },
        }
    }

    /// Pick the message for a failed response.
    ///
    /// Prefers the backend's `errMessage`, then the HTTP status text, then a
    /// default for the error kind. Blank strings are skipped.
    pub fn pick_message(status: u16, err_message: Option<&str>, status_text: Option<&str>) -> String {
        err_message
            .filter(|m| !m.trim().is_empty())
            .or(status_text.filter(|m| !m.trim().is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| default_message(status).to_string())
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiError::Authentication { .. } => 401,
            ApiError::NotFound { .. } => 404,
            ApiError::Api { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Authentication { message, .. }
            | ApiError::NotFound { message, .. }
            | ApiError::Api { message, .. } => message,
        }
    }

    /// Raw `data` from the failed envelope, kept for diagnostics.
    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiError::Authentication { data, .. }
            | ApiError::NotFound { data, .. }
            | ApiError::Api { data, .. } => data.as_ref(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        401 => DEFAULT_AUTHENTICATION_MESSAGE,
        404 => DEFAULT_NOT_FOUND_MESSAGE,
        _ => DEFAULT_API_MESSAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_status_maps_taxonomy() {
        assert!(ApiError::from_status(401, "x", None).is_authentication());
        assert!(ApiError::from_status(404, "x", None).is_not_found());

        let err = ApiError::from_status(500, "boom", Some(json!({"trace": 1})));
        assert_eq!(err.status(), 500);
        assert_eq!(err.message(), "boom");
        assert_eq!(err.data(), Some(&json!({"trace": 1})));
        assert!(!err.is_authentication());
    }

    #[test]
    fn test_status_of_specific_kinds() {
        assert_eq!(ApiError::from_status(401, "x", None).status(), 401);
        assert_eq!(ApiError::from_status(404, "x", None).status(), 404);
    }

    #[test]
    fn test_pick_message_prefers_err_message() {
        let msg = ApiError::pick_message(400, Some("用户名已存在"), Some("Bad Request"));
        assert_eq!(msg, "用户名已存在");
    }

    #[test]
    fn test_pick_message_falls_back_to_status_text() {
        assert_eq!(
            ApiError::pick_message(400, None, Some("Bad Request")),
            "Bad Request"
        );
        assert_eq!(
            ApiError::pick_message(400, Some("  "), Some("Bad Request")),
            "Bad Request"
        );
    }

    #[test]
    fn test_pick_message_defaults_per_kind() {
        assert_eq!(
            ApiError::pick_message(401, None, None),
            DEFAULT_AUTHENTICATION_MESSAGE
        );
        assert_eq!(ApiError::pick_message(404, None, Some("")), DEFAULT_NOT_FOUND_MESSAGE);
        assert_eq!(ApiError::pick_message(599, None, None), DEFAULT_API_MESSAGE);
    }

    #[test]
    fn test_display_is_message() {
        let err = ApiError::from_status(403, "Forbidden", None);
        assert_eq!(err.to_string(), "Forbidden");
    }
}
