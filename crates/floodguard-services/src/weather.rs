//! OpenWeatherMap current conditions and 5-day/3-hour forecast.

use chrono::{DateTime, Utc};
use floodguard_core::{
    Coordinate, CurrentWeather, Forecast, ForecastEntry, ProviderError, WeatherSource,
};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::http::{build_client, read_body, request_error, trim_base};

const SERVICE: &str = "openweathermap";

#[derive(Debug, Default, Deserialize)]
struct Rain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: Option<MainBlock>,
    rain: Option<Rain>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    #[serde(default)]
    weather: Vec<Condition>,
    rain: Option<Rain>,
}

fn first_description(conditions: Vec<Condition>) -> Option<String> {
    conditions.into_iter().find_map(|c| c.description)
}

pub fn parse_current(body: &str) -> Result<CurrentWeather, ProviderError> {
    let payload: CurrentResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::malformed(SERVICE, err))?;
    let rain = payload.rain.unwrap_or_default();
    Ok(CurrentWeather {
        rain_1h_mm: rain.one_hour,
        rain_3h_mm: rain.three_hour,
        temperature_c: payload.main.and_then(|m| m.temp),
        description: first_description(payload.weather),
    })
}

/// Forecast entries with an unrepresentable timestamp are dropped.
pub fn parse_forecast(body: &str) -> Result<Forecast, ProviderError> {
    let payload: ForecastResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::malformed(SERVICE, err))?;
    let entries = payload
        .list
        .into_iter()
        .filter_map(|item| {
            let timestamp: DateTime<Utc> = DateTime::from_timestamp(item.dt, 0)?;
            Some(ForecastEntry {
                timestamp,
                rain_3h_mm: item.rain.and_then(|r| r.three_hour),
                description: first_description(item.weather),
            })
        })
        .collect();
    Ok(Forecast { entries })
}

pub struct OpenWeatherMap {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherMap {
    pub fn new(config: &ServiceConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeouts.weather)?,
            base_url: config.weather_url.clone(),
            api_key: config.openweathermap_api_key.clone(),
        })
    }

    fn fetch(&self, endpoint: &str, at: Coordinate) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| ProviderError::NotConfigured {
            service: SERVICE,
            message: "OPENWEATHERMAP_API_KEY is not set".into(),
        })?;
        let url = format!("{}/{}", trim_base(&self.base_url), endpoint);
        let response = self
            .client
            .get(url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lon", at.lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .map_err(|err| request_error(SERVICE, err))?;
        read_body(SERVICE, response)
    }
}

impl WeatherSource for OpenWeatherMap {
    fn current(&self, at: Coordinate) -> Result<CurrentWeather, ProviderError> {
        parse_current(&self.fetch("weather", at)?)
    }

    fn forecast(&self, at: Coordinate) -> Result<Forecast, ProviderError> {
        parse_forecast(&self.fetch("forecast", at)?)
    }
}
