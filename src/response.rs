use crate::errors::ForecastError;
use crate::models::ForecastResponse;
use axum::{
    http::{
        StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, HeaderName,
        },
    },
    response::{IntoResponse, Response},
};
use tracing::error;

const FALLBACK_BODY: &str =
    r#"{"success":false,"error":"failed to encode response","message":"Erro ao gerar forecast"}"#;

pub fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
        (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}

/// Every envelope goes out with status 200; `success` in the body carries the outcome.
pub fn json_response(body: &ForecastResponse) -> Response {
    let payload = match serde_json::to_vec(body) {
        Ok(payload) => payload,
        Err(err) => {
            error!("{}", ForecastError::from(err));
            FALLBACK_BODY.as_bytes().to_vec()
        }
    };
    (
        StatusCode::OK,
        cors_headers(),
        [(CONTENT_TYPE, "application/json")],
        payload,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FAILURE_MESSAGE;

    #[test]
    fn envelopes_carry_cors_and_json_content_type() {
        let response = json_response(&ForecastResponse::failure("boom"));
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn fallback_body_is_a_failure_envelope() {
        let body: ForecastResponse = serde_json::from_str(FALLBACK_BODY).unwrap();
        assert!(!body.success);
        assert!(body.forecast.is_none());
        assert_eq!(body.message, FAILURE_MESSAGE);
    }
}
