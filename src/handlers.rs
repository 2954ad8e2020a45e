use crate::config::ForecastConfig;
use crate::errors::{ForecastError, Result};
use crate::forecast::forecast as run_model;
use crate::models::{ForecastPointDto, ForecastRequest, ForecastResponse};
use crate::response::{cors_headers, json_response};
use crate::series::TimeSeries;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{sync::Arc, time::Instant};
use tracing::{info, warn};

pub async fn forecast(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();
    let config = Arc::clone(&state.config);

    let outcome = match body {
        Ok(body) => tokio::task::spawn_blocking(move || handle_forecast(&body, &config))
            .await
            .unwrap_or_else(|err| {
                Err(ForecastError::fit(format!("forecast task failed: {err}")))
            }),
        Err(rejection) => Err(ForecastError::validation(format!(
            "invalid request body: {rejection}"
        ))),
    };

    match outcome {
        Ok(response) => {
            info!(elapsed_ms = started.elapsed().as_millis() as u64, "forecast generated");
            json_response(&response)
        }
        Err(err) => {
            warn!(
                kind = err.kind(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "forecast failed: {err}"
            );
            err.into_response()
        }
    }
}

pub async fn preflight() -> Response {
    (StatusCode::OK, cors_headers()).into_response()
}

/// Decodes the request, fits a model and builds the success envelope.
pub fn handle_forecast(body: &[u8], config: &ForecastConfig) -> Result<ForecastResponse> {
    let request: ForecastRequest = serde_json::from_slice(body)
        .map_err(|err| ForecastError::validation(format!("invalid request body: {err}")))?;
    let series = TimeSeries::from_raw(&request.historical)?;
    info!(
        points = series.len(),
        first = %series.first_date(),
        last = %series.last_date(),
        "fitting forecast model"
    );
    let points = run_model(&series, config)?;
    Ok(ForecastResponse::success(
        points.iter().map(ForecastPointDto::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        CONTENT_TYPE,
    };
    use serde_json::json;

    fn history(days: usize) -> serde_json::Value {
        let points: Vec<_> = (0..days)
            .map(|d| {
                json!({ "date": format!("2024-01-{:02}", d + 1), "price": 10.0 + d as f64 })
            })
            .collect();
        json!({ "historical": points })
    }

    #[test]
    fn valid_body_produces_seven_points() {
        let body = serde_json::to_vec(&history(20)).unwrap();
        let response = handle_forecast(&body, &ForecastConfig::default()).unwrap();
        assert!(response.success);
        let forecast = response.forecast.unwrap();
        assert_eq!(forecast.len(), 7);
        assert_eq!(forecast[0].date, "2024-01-21");
        assert_eq!(forecast[6].date, "2024-01-27");
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let err = handle_forecast(b"{not json", &ForecastConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().starts_with("invalid request body"));
    }

    #[test]
    fn empty_body_and_missing_key_are_validation_errors() {
        let config = ForecastConfig::default();
        assert_eq!(handle_forecast(b"", &config).unwrap_err().kind(), "validation");
        let err = handle_forecast(br#"{"prices": []}"#, &config).unwrap_err();
        assert!(err.to_string().contains("historical"));
    }

    #[test]
    fn empty_history_is_rejected() {
        let err =
            handle_forecast(br#"{"historical": []}"#, &ForecastConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn response_is_byte_identical_for_identical_input() {
        let body = serde_json::to_vec(&history(25)).unwrap();
        let config = ForecastConfig::default();
        let a = serde_json::to_vec(&handle_forecast(&body, &config).unwrap()).unwrap();
        let b = serde_json::to_vec(&handle_forecast(&body, &config).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn preflight_has_cors_headers_and_no_body() {
        let response = preflight().await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert!(headers.get(CONTENT_TYPE).is_none());
    }
}
