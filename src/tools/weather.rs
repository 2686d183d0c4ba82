//! `get_weather`

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherParams {
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherReport {
    pub temperature: String,
    pub conditions: String,
    pub city: String,
}

/// Canned conditions; the city is echoed back.
pub async fn get_weather(params: WeatherParams) -> WeatherReport {
    WeatherReport {
        temperature: "22°C".to_string(),
        conditions: "Sunny".to_string(),
        city: params.city,
    }
}
