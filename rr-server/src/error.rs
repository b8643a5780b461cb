//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rr_core::geometry::GeometryError;
use rr_core::provider::ProviderError;
use rr_core::session::SessionError;
use rr_core::wire::ErrorPayload;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn no_replay() -> Self {
        ApiError::NotFound("No active replay".to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::InvalidSession(_) | ProviderError::InvalidSegment(_) => {
                ApiError::BadRequest(e.to_string())
            }
            ProviderError::NotFound(_) | ProviderError::UnknownSeason(_) => {
                ApiError::NotFound(e.to_string())
            }
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<GeometryError> for ApiError {
    fn from(e: GeometryError) -> Self {
        match e {
            GeometryError::NoValidLap => ApiError::NotFound(e.to_string()),
            GeometryError::InsufficientSamples(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Geometry(g) => g.into(),
            SessionError::NoFrames => ApiError::BadRequest(e.to_string()),
            // the server's own replay config is at fault, not the request
            SessionError::Config(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (
            status,
            Json(ErrorPayload {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rr_core::config::ConfigError;
    use rr_core::provider::{SessionKind, SessionSelection};

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                ProviderError::InvalidSession("FP2".to_string()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ProviderError::NotFound(SessionSelection::new(2024, 1, SessionKind::Race)).into(),
                StatusCode::NOT_FOUND,
            ),
            (ProviderError::UnknownSeason(1900).into(), StatusCode::NOT_FOUND),
            (
                ProviderError::Backend("timeout".to_string()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ProviderError::InvalidSegment("Q4".to_string()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (GeometryError::NoValidLap.into(), StatusCode::NOT_FOUND),
            (SessionError::NoFrames.into(), StatusCode::BAD_REQUEST),
            (
                SessionError::Geometry(GeometryError::NoValidLap).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                SessionError::Config(ConfigError::Invalid {
                    field: "track_width",
                    reason: "must be positive, got 0".to_string(),
                })
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Conflict("busy".to_string()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[test]
    fn test_message_passes_through() {
        let err: ApiError = ProviderError::UnknownSeason(1900).into();
        assert_eq!(err.to_string(), "no events for season 1900");
    }
}
