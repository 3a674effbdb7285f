use crate::error::{PipelineError, RejectKind};
use crate::platform::{ApiErrorKind, Challenge, CreatedGroupPayload, PlatformError};

use super::CreatedGroup;

/// Classified result of a single create-group call.
#[derive(Debug)]
pub enum CreateAttempt {
    Created(CreatedGroup),
    NeedsChallenge(Challenge),
    /// Terminal refusal; retrying with the same token is pointless.
    Rejected(RejectKind),
    /// Call went through but yielded no usable group id (missing, malformed
    /// or unknown error); retried as-is.
    Unextractable(String),
}

/// Map a raw create-group result onto the attempt vocabulary.
///
/// Only transport-level failures are returned as errors and end the loop.
pub fn classify(
    result: Result<CreatedGroupPayload, PlatformError>,
) -> Result<CreateAttempt, PipelineError> {
    match result {
        Ok(payload) => match payload.id.filter(|id| *id > 0) {
            Some(id) if i64::try_from(id).is_err() => Ok(CreateAttempt::Unextractable(format!(
                "group id {} is out of owner id range",
                id
            ))),
            Some(id) => Ok(CreateAttempt::Created(CreatedGroup {
                id,
                screen_name: payload
                    .screen_name
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| format!("club{}", id)),
            })),
            None => Ok(CreateAttempt::Unextractable(
                "response carries no group id".to_string(),
            )),
        },
        Err(PlatformError::Api(api)) => Ok(match api.kind {
            ApiErrorKind::ChallengeRequired(challenge) => CreateAttempt::NeedsChallenge(challenge),
            ApiErrorKind::AuthorizationConflict => {
                CreateAttempt::Rejected(RejectKind::AuthorizationConflict)
            }
            ApiErrorKind::RateLimited => CreateAttempt::Rejected(RejectKind::RateLimited),
            ApiErrorKind::InvalidCredential => {
                CreateAttempt::Rejected(RejectKind::InvalidCredential)
            }
            ApiErrorKind::Other => CreateAttempt::Unextractable(format!("platform error {}", api)),
        }),
        Err(PlatformError::Decode(reason)) => Ok(CreateAttempt::Unextractable(reason)),
        Err(other) => Err(PipelineError::TransportFailure(other.to_string())),
    }
}

impl CreateAttempt {
    /// Metric label for this attempt.
    pub fn label(&self) -> &'static str {
        match self {
            CreateAttempt::Created(_) => "created",
            CreateAttempt::NeedsChallenge(_) => "challenge",
            CreateAttempt::Rejected(_) => "rejected",
            CreateAttempt::Unextractable(_) => "unextractable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ApiError;
    use serde_json::json;

    fn api_error(payload: serde_json::Value) -> Result<CreatedGroupPayload, PlatformError> {
        Err(PlatformError::Api(ApiError::from_payload(payload)))
    }

    #[test]
    fn test_created_with_screen_name() {
        let attempt = classify(Ok(CreatedGroupPayload {
            id: Some(42),
            screen_name: Some("cats42".to_string()),
        }))
        .unwrap();
        match attempt {
            CreateAttempt::Created(group) => {
                assert_eq!(group.id, 42);
                assert_eq!(group.screen_name, "cats42");
            }
            other => panic!("unexpected attempt: {:?}", other),
        }
    }

    #[test]
    fn test_created_without_screen_name_falls_back_to_club() {
        let attempt = classify(Ok(CreatedGroupPayload {
            id: Some(9),
            screen_name: None,
        }))
        .unwrap();
        assert!(matches!(attempt, CreateAttempt::Created(ref g) if g.screen_name == "club9"));
    }

    #[test]
    fn test_missing_id_is_unextractable() {
        let attempt = classify(Ok(CreatedGroupPayload::default())).unwrap();
        assert!(matches!(attempt, CreateAttempt::Unextractable(_)));
    }

    #[test]
    fn test_zero_id_is_unextractable() {
        let attempt = classify(Ok(CreatedGroupPayload {
            id: Some(0),
            screen_name: Some("x".to_string()),
        }))
        .unwrap();
        assert!(matches!(attempt, CreateAttempt::Unextractable(_)));
    }

    #[test]
    fn test_rejections() {
        let conflict = classify(api_error(json!({ "error_code": 5 }))).unwrap();
        assert!(matches!(
            conflict,
            CreateAttempt::Rejected(RejectKind::AuthorizationConflict)
        ));

        let flood = classify(api_error(json!({ "error_msg": "Flood control" }))).unwrap();
        assert!(matches!(flood, CreateAttempt::Rejected(RejectKind::RateLimited)));
    }

    #[test]
    fn test_unknown_api_error_is_retryable() {
        let attempt = classify(api_error(json!({ "error_code": 100, "error_msg": "bad" }))).unwrap();
        assert!(matches!(attempt, CreateAttempt::Unextractable(_)));
    }

    #[test]
    fn test_malformed_response_is_retryable() {
        let attempt = classify(Err(PlatformError::Decode(
            "no response field in {}".to_string(),
        )))
        .unwrap();
        assert!(matches!(attempt, CreateAttempt::Unextractable(ref r) if r.contains("no response")));
    }

    #[test]
    fn test_id_beyond_owner_range_is_unextractable() {
        let attempt = classify(Ok(CreatedGroupPayload {
            id: Some(u64::MAX),
            screen_name: Some("huge".to_string()),
        }))
        .unwrap();
        assert!(matches!(attempt, CreateAttempt::Unextractable(_)));
    }

    #[test]
    fn test_transport_error_is_terminal() {
        let err = classify(Err(PlatformError::Transport("connection reset".to_string())))
            .unwrap_err();
        assert!(matches!(err, PipelineError::TransportFailure(_)));
    }
}
