//! Pipe-delimited wire format of the solving service.
//!
//! Submission answers `OK|<request id>`; polling answers `CAPCHA_NOT_READY`,
//! `OK|<solution>`, or an error code such as `ERROR_CAPTCHA_UNSOLVABLE`.

use super::SolveError;

const NOT_READY: &str = "CAPCHA_NOT_READY";

/// State of a submitted challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    Pending,
    Solved(String),
    Failed(String),
}

/// Split `OK|<value>` into its value.
fn ok_value(body: &str) -> Option<&str> {
    let (status, value) = body.split_once('|')?;
    (status == "OK" && !value.is_empty()).then_some(value)
}

/// Parse the submission response into the request id.
pub fn parse_submit_response(body: &str) -> Result<String, SolveError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(SolveError::UnexpectedResponse("empty body".to_string()));
    }
    ok_value(body)
        .map(str::to_string)
        .ok_or_else(|| SolveError::Rejected(body.to_string()))
}

/// Parse a polling response.
pub fn parse_poll_response(body: &str) -> Result<PollStatus, SolveError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(SolveError::UnexpectedResponse("empty body".to_string()));
    }
    if body == NOT_READY {
        return Ok(PollStatus::Pending);
    }
    Ok(match ok_value(body) {
        Some(solution) => PollStatus::Solved(solution.to_string()),
        None => PollStatus::Failed(body.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_ok() {
        assert_eq!(parse_submit_response("OK|123456").unwrap(), "123456");
    }

    #[test]
    fn test_submit_error_code() {
        let err = parse_submit_response("ERROR_ZERO_BALANCE").unwrap_err();
        assert!(matches!(err, SolveError::Rejected(ref m) if m == "ERROR_ZERO_BALANCE"));
    }

    #[test]
    fn test_submit_empty_body() {
        assert!(matches!(
            parse_submit_response("  ").unwrap_err(),
            SolveError::UnexpectedResponse(_)
        ));
    }

    #[test]
    fn test_submit_ok_without_id_is_rejected() {
        assert!(parse_submit_response("OK|").is_err());
    }

    #[test]
    fn test_poll_pending() {
        assert_eq!(
            parse_poll_response("CAPCHA_NOT_READY\n").unwrap(),
            PollStatus::Pending
        );
    }

    #[test]
    fn test_poll_solved() {
        assert_eq!(
            parse_poll_response("OK|x7kq2").unwrap(),
            PollStatus::Solved("x7kq2".to_string())
        );
    }

    #[test]
    fn test_poll_failed() {
        assert_eq!(
            parse_poll_response("ERROR_CAPTCHA_UNSOLVABLE").unwrap(),
            PollStatus::Failed("ERROR_CAPTCHA_UNSOLVABLE".to_string())
        );
    }

    #[test]
    fn test_solution_may_contain_pipe() {
        assert_eq!(
            parse_poll_response("OK|ab|cd").unwrap(),
            PollStatus::Solved("ab|cd".to_string())
        );
    }
}
