pub mod app;
pub mod config;
pub mod errors;
pub mod forecast;
pub mod handlers;
pub mod linalg;
pub mod model;
pub mod models;
pub mod response;
pub mod seasonality;
pub mod series;
pub mod state;
pub mod trend;
pub mod uncertainty;

pub use app::router;
pub use config::{ConfigError, ForecastConfig, ServerConfig};
pub use errors::ForecastError;
pub use forecast::{ForecastPoint, forecast};
pub use series::TimeSeries;
pub use state::AppState;
