use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SUCCESS_MESSAGE: &str = "Forecast gerado com sucesso";
pub const FAILURE_MESSAGE: &str = "Erro ao gerar forecast";

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub historical: Vec<RawPoint>,
}

/// One history entry as sent by the caller. Fields stay loosely typed so the
/// preprocessor can report which entry and field is malformed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPoint {
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
}

impl RawPoint {
    pub fn new(date: &str, price: f64) -> Self {
        Self {
            date: Some(Value::from(date)),
            price: Some(Value::from(price)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPointDto {
    pub date: String,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<ForecastPointDto>>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl ForecastResponse {
    pub fn success(forecast: Vec<ForecastPointDto>) -> Self {
        Self {
            forecast: Some(forecast),
            success: true,
            error: None,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            forecast: None,
            success: false,
            error: Some(error.into()),
            message: FAILURE_MESSAGE.to_string(),
        }
    }
}
