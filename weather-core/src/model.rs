use serde::{Deserialize, Serialize};

/// Current conditions observed at the station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub humidity: f64,
    pub wind_kmh: f64,
    pub pressure_mb: f64,
    pub feels_like_c: f64,
    pub uv_index: f64,
    pub visibility_km: f64,
    pub description: String,
    /// ISO-8601 local time of the observation (or of the fallback).
    pub timestamp: String,
    pub station: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub high_c: f64,
    pub low_c: f64,
    pub conditions: String,
    pub precipitation_chance: f64,
    pub wind_kmh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedDay {
    pub day: String,
    pub high_c: f64,
    pub low_c: f64,
    pub conditions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_chance: Option<f64>,
}

/// Short forecast: today, tomorrow and a few further days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub today: DayForecast,
    pub tomorrow: DayForecast,
    #[serde(default)]
    pub extended: Vec<ExtendedDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Everything the chat pipeline grounds a reply on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllWeather {
    pub current: WeatherSnapshot,
    pub forecast: Forecast,
    pub location: String,
    pub station_id: String,
}
