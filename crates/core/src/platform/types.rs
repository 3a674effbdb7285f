//! Platform wire types and the closed error vocabulary.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Short-lived access token for platform method calls.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} chars>)", self.0.len())
    }
}

/// A human-verification puzzle blocking a method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Platform-issued challenge id, echoed back with the answer.
    pub sid: String,
    pub image_url: String,
}

/// Solution to a [`Challenge`], merged into the retried call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeAnswer {
    pub sid: String,
    pub key: String,
}

/// Recognised kinds of platform error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    ChallengeRequired(Challenge),
    /// The token is bound to a different client address.
    AuthorizationConflict,
    RateLimited,
    InvalidCredential,
    Other,
}

const CODE_AUTHORIZATION: i64 = 5;
const CODE_FLOOD_CONTROL: i64 = 9;
const CODE_CAPTCHA: i64 = 14;
const CODE_ANONYMOUS_TOKEN: i64 = 1116;

/// A structured error returned by a platform method.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: Option<i64>,
    pub message: String,
    pub kind: ApiErrorKind,
    /// The error object as received, for logging.
    pub payload: Value,
}

#[derive(Debug, Default, Deserialize)]
struct RawApiError {
    error_code: Option<i64>,
    error_msg: Option<String>,
    captcha_sid: Option<Value>,
    captcha_img: Option<String>,
}

impl ApiError {
    /// Classify an `error` object from a method response.
    pub fn from_payload(payload: Value) -> Self {
        let raw: RawApiError = serde_json::from_value(payload.clone()).unwrap_or_default();
        let message = raw.error_msg.clone().unwrap_or_default();
        let code = raw.error_code;

        let kind = if code == Some(CODE_CAPTCHA) || message == "Captcha needed" {
            match (raw.captcha_sid.as_ref().and_then(value_to_param), raw.captcha_img) {
                (Some(sid), Some(image_url)) => {
                    ApiErrorKind::ChallengeRequired(Challenge { sid, image_url })
                }
                _ => ApiErrorKind::Other,
            }
        } else if code == Some(CODE_AUTHORIZATION) {
            ApiErrorKind::AuthorizationConflict
        } else if code == Some(CODE_FLOOD_CONTROL) || message == "Flood control" {
            ApiErrorKind::RateLimited
        } else if code == Some(CODE_ANONYMOUS_TOKEN) || message == "Anonymous token is invalid" {
            ApiErrorKind::InvalidCredential
        } else {
            ApiErrorKind::Other
        };

        Self {
            code,
            message,
            kind,
            payload,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.payload),
        }
    }
}

/// Render a JSON scalar as a request parameter (numbers and strings alike).
pub(crate) fn value_to_param(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parameters of a create-group call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupParams {
    pub title: String,
    pub description: String,
    pub answer: Option<ChallengeAnswer>,
}

impl CreateGroupParams {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            answer: None,
        }
    }

    pub fn with_answer(mut self, answer: ChallengeAnswer) -> Self {
        self.answer = Some(answer);
        self
    }
}

/// Success payload of a create-group call. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedGroupPayload {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub screen_name: Option<String>,
}

/// Tokens returned by the photo upload endpoint, consumed by the save call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPhoto {
    pub server: String,
    pub photo: String,
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_captcha() {
        let err = ApiError::from_payload(json!({
            "error_code": 14,
            "error_msg": "Captcha needed",
            "captcha_sid": 298327211784u64,
            "captcha_img": "https://vk.com/captcha.php?sid=298327211784"
        }));
        assert_eq!(
            err.kind,
            ApiErrorKind::ChallengeRequired(Challenge {
                sid: "298327211784".to_string(),
                image_url: "https://vk.com/captcha.php?sid=298327211784".to_string(),
            })
        );
    }

    #[test]
    fn test_classify_captcha_without_image_is_other() {
        let err = ApiError::from_payload(json!({ "error_msg": "Captcha needed" }));
        assert_eq!(err.kind, ApiErrorKind::Other);
    }

    #[test]
    fn test_classify_authorization_conflict() {
        let err = ApiError::from_payload(json!({
            "error_code": 5,
            "error_msg": "User authorization failed: access_token was given to another ip address."
        }));
        assert_eq!(err.kind, ApiErrorKind::AuthorizationConflict);
    }

    #[test]
    fn test_classify_flood_control_by_message() {
        let err = ApiError::from_payload(json!({ "error_msg": "Flood control" }));
        assert_eq!(err.kind, ApiErrorKind::RateLimited);
    }

    #[test]
    fn test_classify_invalid_token() {
        let err = ApiError::from_payload(json!({
            "error_code": 1116,
            "error_msg": "Anonymous token is invalid"
        }));
        assert_eq!(err.kind, ApiErrorKind::InvalidCredential);
    }

    #[test]
    fn test_classify_unknown() {
        let err = ApiError::from_payload(json!({ "error_code": 100, "error_msg": "One of the parameters specified was missing" }));
        assert_eq!(err.kind, ApiErrorKind::Other);
        assert_eq!(err.to_string(), "[100] One of the parameters specified was missing");
    }

    #[test]
    fn test_captcha_takes_priority_over_other_signals() {
        let err = ApiError::from_payload(json!({
            "error_code": 14,
            "error_msg": "Flood control",
            "captcha_sid": "1",
            "captcha_img": "http://img"
        }));
        assert!(matches!(err.kind, ApiErrorKind::ChallengeRequired(_)));
    }

    #[test]
    fn test_access_token_debug_hides_value() {
        let token = AccessToken::new("vk1.a.secret");
        assert!(!format!("{:?}", token).contains("secret"));
    }
}
