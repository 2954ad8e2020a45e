use crate::models::ForecastResponse;
use crate::response::json_response;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed request body, bad dates or values, undersized history.
    #[error("{0}")]
    Validation(String),

    /// Numerical failure while fitting or evaluating the model.
    #[error("{0}")]
    Fit(String),

    #[error("failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn fit(message: impl Into<String>) -> Self {
        Self::Fit(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Fit(_) => "fit",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl axum::response::IntoResponse for ForecastError {
    fn into_response(self) -> axum::response::Response {
        json_response(&ForecastResponse::failure(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn display_carries_message_verbatim() {
        let err = ForecastError::validation("historical[0].date: invalid calendar date \"x\"");
        assert_eq!(
            err.to_string(),
            "historical[0].date: invalid calendar date \"x\""
        );
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn serde_errors_convert_to_serialization() {
        let source = serde_json::from_str::<f64>("nope").unwrap_err();
        let err = ForecastError::from(source);
        assert_eq!(err.kind(), "serialization");
        assert!(err.to_string().starts_with("failed to encode response"));
    }

    #[test]
    fn errors_render_with_ok_status() {
        let response = ForecastError::fit("singular system").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
