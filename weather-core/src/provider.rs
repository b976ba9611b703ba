use async_trait::async_trait;
use chrono::Local;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    model::{AllWeather, DayForecast, ExtendedDay, Forecast, WeatherSnapshot},
    provider::wunderground::WundergroundSource,
};

pub mod units;
pub mod wunderground;

pub const FALLBACK_NOTE: &str = "Using fallback data";

/// A raw source of station data. Implementations may fail.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_current(&self) -> anyhow::Result<WeatherSnapshot>;

    async fn fetch_forecast(&self) -> anyhow::Result<Forecast>;
}

/// Total facade over a [`WeatherSource`].
///
/// Every method returns a complete record. Fetch or parse failures are logged
/// and replaced by fallback values carrying an `error` and a `note`.
#[derive(Debug, Clone)]
pub struct WeatherAgent {
    source: Arc<dyn WeatherSource>,
    station_id: String,
    location: String,
}

impl WeatherAgent {
    pub fn new(source: Arc<dyn WeatherSource>, station_id: String, location: String) -> Self {
        Self {
            source,
            station_id,
            location,
        }
    }

    /// Agent backed by the scraping source described in `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = WundergroundSource::from_config(config)?;
        Ok(Self::new(
            Arc::new(source),
            config.station_id.clone(),
            config.location.clone(),
        ))
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub async fn get_current_conditions(&self) -> WeatherSnapshot {
        match self.source.fetch_current().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("current conditions unavailable, using fallback: {err:#}");
                fallback_snapshot(&self.station_id, format!("{err:#}"))
            }
        }
    }

    pub async fn get_forecast(&self) -> Forecast {
        match self.source.fetch_forecast().await {
            Ok(forecast) => forecast,
            Err(err) => {
                tracing::warn!("forecast unavailable, using fallback: {err:#}");
                fallback_forecast(format!("{err:#}"))
            }
        }
    }

    /// Current conditions and forecast, fetched concurrently.
    pub async fn get_all_weather_data(&self) -> AllWeather {
        let (current, forecast) = tokio::join!(self.get_current_conditions(), self.get_forecast());

        AllWeather {
            current,
            forecast,
            location: self.location.clone(),
            station_id: self.station_id.clone(),
        }
    }
}

pub fn fallback_snapshot(station_id: &str, error: String) -> WeatherSnapshot {
    WeatherSnapshot {
        temperature_c: 24.5,
        humidity: 65.0,
        wind_kmh: 12.0,
        pressure_mb: 1015.0,
        feels_like_c: 25.0,
        uv_index: 4.0,
        visibility_km: 10.0,
        description: "Partly Cloudy".to_string(),
        timestamp: Local::now().to_rfc3339(),
        station: station_id.to_string(),
        error: Some(error),
        note: Some(FALLBACK_NOTE.to_string()),
    }
}

pub fn fallback_forecast(error: String) -> Forecast {
    Forecast {
        today: DayForecast {
            high_c: 28.0,
            low_c: 18.0,
            conditions: "Partly Cloudy (fallback)".to_string(),
            precipitation_chance: 20.0,
            wind_kmh: 15.0,
        },
        tomorrow: DayForecast {
            high_c: 30.0,
            low_c: 19.0,
            conditions: "Sunny (fallback)".to_string(),
            precipitation_chance: 10.0,
            wind_kmh: 12.0,
        },
        extended: vec![
            ExtendedDay {
                day: "Day 3".to_string(),
                high_c: 29.0,
                low_c: 20.0,
                conditions: "Mostly Sunny (fallback)".to_string(),
                precipitation_chance: None,
            },
            ExtendedDay {
                day: "Day 4".to_string(),
                high_c: 27.0,
                low_c: 18.0,
                conditions: "Cloudy (fallback)".to_string(),
                precipitation_chance: None,
            },
            ExtendedDay {
                day: "Day 5".to_string(),
                high_c: 25.0,
                low_c: 17.0,
                conditions: "Rainy (fallback)".to_string(),
                precipitation_chance: Some(70.0),
            },
        ],
        error: Some(error),
        note: Some(FALLBACK_NOTE.to_string()),
    }
}
