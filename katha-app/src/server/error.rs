//! Mapping story errors onto HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use katha::Error;

/// Status code a failed story operation answers with.
#[must_use]
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NoStory | Error::Busy => StatusCode::CONFLICT,
        Error::Llm(_) | Error::Synthesis(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A story error answered as plain text, for non-page routes.
#[derive(Debug)]
pub struct PlainError(pub Error);

impl From<Error> for PlainError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for PlainError {
    fn into_response(self) -> Response {
        (status_for(&self.0), self.0.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katha::LlmError;

    #[test]
    fn statuses() {
        assert_eq!(
            status_for(&Error::validation("topic", "missing")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(&Error::NoStory), StatusCode::CONFLICT);
        assert_eq!(status_for(&Error::Busy), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&Error::Llm(LlmError::network("down"))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::synthesis(LlmError::rate_limited("google"))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::Template("bad".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn plain_error_body_is_message() {
        let response = PlainError(Error::NoStory).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
