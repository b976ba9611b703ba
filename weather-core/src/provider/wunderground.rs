use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use std::time::Duration;

use crate::{
    Config,
    error::ScrapeError,
    model::{DayForecast, ExtendedDay, Forecast, WeatherSnapshot},
    provider::units::{fahrenheit_to_celsius, inhg_to_mb, miles_to_km, mph_to_kmh},
};

use super::WeatherSource;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const DEFAULT_VISIBILITY_KM: f64 = 10.0;
const EXTENDED_DAYS: usize = 3;

/// Scrapes a Weather Underground personal weather station.
///
/// Both the dashboard and the forecast page embed their data as JSON inside
/// `<script id="app-root-state">`; readings there are imperial.
#[derive(Debug, Clone)]
pub struct WundergroundSource {
    http: Client,
    base_url: String,
    station_id: String,
    forecast_path: String,
}

impl WundergroundSource {
    pub fn new(
        base_url: &str,
        station_id: &str,
        forecast_path: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            station_id: station_id.to_string(),
            forecast_path: forecast_path.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.station.base_url,
            &config.station_id,
            &config.station.forecast_path,
            Duration::from_secs(config.station.timeout_secs),
        )
    }

    fn dashboard_url(&self) -> String {
        format!("{}/dashboard/pws/{}", self.base_url, self.station_id)
    }

    fn forecast_url(&self) -> String {
        format!("{}{}/{}", self.base_url, self.forecast_path, self.station_id)
    }

    async fn fetch_page(&self, url: &str, what: &str) -> Result<String> {
        tracing::debug!("fetching {what} page: {url}");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Weather Underground ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read Weather Underground {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Weather Underground {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherSource for WundergroundSource {
    async fn fetch_current(&self) -> Result<WeatherSnapshot> {
        let html = self.fetch_page(&self.dashboard_url(), "dashboard").await?;
        let state = extract_app_state(&html).context("Failed to read dashboard page")?;
        let snapshot =
            parse_current(&state, &self.station_id).context("Failed to parse current conditions")?;
        Ok(snapshot)
    }

    async fn fetch_forecast(&self) -> Result<Forecast> {
        let html = self.fetch_page(&self.forecast_url(), "forecast").await?;
        let state = extract_app_state(&html).context("Failed to read forecast page")?;
        let forecast = parse_forecast(&state).context("Failed to parse forecast")?;
        Ok(forecast)
    }
}

/// Pull the embedded application state out of a page and parse it.
pub fn extract_app_state(html: &str) -> Result<Value, ScrapeError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#app-root-state").map_err(|_| ScrapeError::MissingState)?;

    let raw: String = document
        .select(&selector)
        .next()
        .ok_or(ScrapeError::MissingState)?
        .text()
        .collect();

    if raw.trim().is_empty() {
        return Err(ScrapeError::MissingState);
    }

    Ok(serde_json::from_str(&decode_transfer_state(&raw))?)
}

/// Undo the entity escaping used by the page's transfer state.
fn decode_transfer_state(raw: &str) -> String {
    raw.replace("&q;", "\"")
        .replace("&s;", "'")
        .replace("&l;", "<")
        .replace("&g;", ">")
        .replace("&a;", "&")
}

/// Depth-first search for the first object holding every key in `keys`.
fn find_object<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if keys.iter().all(|k| map.contains_key(*k)) {
                return Some(value);
            }
            map.values().find_map(|v| find_object(v, keys))
        }
        Value::Array(items) => items.iter().find_map(|v| find_object(v, keys)),
        _ => None,
    }
}

/// Depth-first search for the first non-empty string under `key`.
fn find_string<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    match value {
        Value::Object(map) => map
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| map.values().find_map(|v| find_string(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_string(v, key)),
        _ => None,
    }
}

fn number(obj: &Value, key: &'static str) -> Result<f64, ScrapeError> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or(ScrapeError::MissingField(key))
}

fn nth_number(obj: &Value, key: &str, index: usize) -> Option<f64> {
    obj.get(key)?.get(index)?.as_f64()
}

fn nth_string(obj: &Value, key: &str, index: usize) -> Option<String> {
    obj.get(key)?.get(index)?.as_str().map(str::to_string)
}

pub fn parse_current(state: &Value, station_id: &str) -> Result<WeatherSnapshot, ScrapeError> {
    let observations = find_object(state, &["observations"])
        .and_then(|v| v.get("observations"))
        .and_then(Value::as_array)
        .ok_or(ScrapeError::MissingSection("observations"))?;

    let obs = observations
        .iter()
        .find(|o| o.get("imperial").is_some())
        .ok_or(ScrapeError::MissingSection("imperial observation"))?;
    let imperial = &obs["imperial"];

    let temp_f = number(imperial, "temp")?;
    let feels_f = imperial
        .get("heatIndex")
        .and_then(Value::as_f64)
        .or_else(|| imperial.get("windChill").and_then(Value::as_f64))
        .unwrap_or(temp_f);
    let precip_rate = imperial.get("precipRate").and_then(Value::as_f64).unwrap_or(0.0);

    let description = match find_string(state, "wxPhraseLong") {
        Some(phrase) => phrase.to_string(),
        None if precip_rate > 0.0 => "Rain".to_string(),
        None => "Clear".to_string(),
    };

    let visibility_km = find_object(state, &["visibility"])
        .and_then(|v| v.get("visibility"))
        .and_then(Value::as_f64)
        .map(miles_to_km)
        .unwrap_or(DEFAULT_VISIBILITY_KM);

    let timestamp = obs
        .get("obsTimeLocal")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Local::now().to_rfc3339());

    Ok(WeatherSnapshot {
        temperature_c: fahrenheit_to_celsius(temp_f),
        humidity: number(obs, "humidity")?,
        wind_kmh: mph_to_kmh(number(imperial, "windSpeed")?),
        pressure_mb: inhg_to_mb(number(imperial, "pressure")?),
        feels_like_c: fahrenheit_to_celsius(feels_f),
        uv_index: obs.get("uv").and_then(Value::as_f64).unwrap_or(0.0),
        visibility_km,
        description,
        timestamp,
        station: obs
            .get("stationID")
            .and_then(Value::as_str)
            .unwrap_or(station_id)
            .to_string(),
        error: None,
        note: None,
    })
}

pub fn parse_forecast(state: &Value) -> Result<Forecast, ScrapeError> {
    let daily = find_object(state, &["temperatureMax", "temperatureMin", "daypart"])
        .ok_or(ScrapeError::MissingSection("daily forecast"))?;
    let daypart = daily
        .get("daypart")
        .and_then(|d| d.get(0))
        .ok_or(ScrapeError::MissingSection("daypart"))?;

    let days = daily
        .get("temperatureMin")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);
    if days < 2 {
        return Err(ScrapeError::MissingSection("two forecast days"));
    }

    // Day and night parts are interleaved; today's day part is null once it has passed.
    let part_number = |key: &str, day: usize| {
        nth_number(daypart, key, day * 2).or_else(|| nth_number(daypart, key, day * 2 + 1))
    };
    let part_string = |key: &str, day: usize| {
        nth_string(daypart, key, day * 2).or_else(|| nth_string(daypart, key, day * 2 + 1))
    };

    let high_f = |day: usize| {
        nth_number(daily, "temperatureMax", day)
            .or_else(|| nth_number(daily, "calendarDayTemperatureMax", day))
    };

    let day_forecast = |day: usize| -> Result<DayForecast, ScrapeError> {
        let low_f =
            nth_number(daily, "temperatureMin", day).ok_or(ScrapeError::MissingField("temperatureMin"))?;
        Ok(DayForecast {
            high_c: fahrenheit_to_celsius(high_f(day).ok_or(ScrapeError::MissingField("temperatureMax"))?),
            low_c: fahrenheit_to_celsius(low_f),
            conditions: part_string("wxPhraseLong", day).unwrap_or_else(|| "Unknown".to_string()),
            precipitation_chance: part_number("precipChance", day).unwrap_or(0.0),
            wind_kmh: part_number("windSpeed", day).map(mph_to_kmh).unwrap_or(0.0),
        })
    };

    let today = day_forecast(0)?;
    let tomorrow = day_forecast(1)?;

    let extended = (2..days.min(2 + EXTENDED_DAYS))
        .filter_map(|day| {
            let high = high_f(day)?;
            let low = nth_number(daily, "temperatureMin", day)?;
            Some(ExtendedDay {
                day: nth_string(daily, "dayOfWeek", day).unwrap_or_else(|| format!("Day {}", day + 1)),
                high_c: fahrenheit_to_celsius(high),
                low_c: fahrenheit_to_celsius(low),
                conditions: part_string("wxPhraseLong", day).unwrap_or_else(|| "Unknown".to_string()),
                precipitation_chance: part_number("precipChance", day),
            })
        })
        .collect();

    Ok(Forecast {
        today,
        tomorrow,
        extended,
        error: None,
        note: None,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
