use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{
    Config,
    error::SourceError,
    location::DeviceLocation,
    model::{
        City, Coordinate, CurrentConditions, DayWeather, DewPoint, HourWeather, Humidity,
        PlaceCandidate, PlaceQuery, Pressure, PressureTrend, UvIndex, WeatherAlert, Wind,
    },
    provider::{geocoding::OpenMeteoGeocoder, nws::NwsAlerts, openmeteo::OpenMeteoSource},
};

pub mod geocoding;
pub mod nws;
pub mod openmeteo;

/// Per-facet weather queries, all keyed by coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn current_weather(&self, at: Coordinate) -> Result<CurrentConditions, SourceError>;
    async fn hourly_forecast(&self, at: Coordinate) -> Result<Vec<HourWeather>, SourceError>;
    async fn daily_forecast(&self, at: Coordinate) -> Result<Vec<DayWeather>, SourceError>;
    async fn humidity(&self, at: Coordinate) -> Result<Humidity, SourceError>;
    async fn dew_point(&self, at: Coordinate) -> Result<DewPoint, SourceError>;
    async fn wind(&self, at: Coordinate) -> Result<Wind, SourceError>;
    async fn uv_index(&self, at: Coordinate) -> Result<UvIndex, SourceError>;
    async fn pressure(&self, at: Coordinate) -> Result<Pressure, SourceError>;
    async fn pressure_trend(&self, at: Coordinate) -> Result<PressureTrend, SourceError>;
    /// `Ok(None)` when no alert is active for the point.
    async fn active_alert(&self, at: Coordinate) -> Result<Option<WeatherAlert>, SourceError>;
}

/// Free-text place search.
#[async_trait]
pub trait PlaceSearch: Send + Sync + Debug {
    async fn search(&self, query: &PlaceQuery) -> Result<Vec<PlaceCandidate>, SourceError>;
}

/// Device position and time zone resolution.
#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    async fn current_city(&self) -> Result<City, SourceError>;
    async fn timezone(&self, at: Coordinate) -> Result<Tz, SourceError>;
}

/// The three sources a client needs, ready to hand to the controllers.
#[derive(Debug, Clone)]
pub struct Sources {
    pub weather: Arc<dyn WeatherSource>,
    pub search: Arc<dyn PlaceSearch>,
    pub location: Arc<dyn LocationSource>,
}

pub(crate) fn http_client(config: &Config) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .user_agent(config.http.user_agent.as_str())
        .build()
        .map_err(|source| SourceError::Request { service: "http client", source })
}

/// Construct the HTTP-backed sources from config. They share one client.
pub fn sources_from_config(config: &Config) -> Result<Sources, SourceError> {
    let http = http_client(config)?;
    let endpoints = &config.endpoints;

    let alerts = NwsAlerts::new(http.clone(), endpoints.alerts.clone());
    let forecast =
        OpenMeteoSource::new(http.clone(), endpoints.forecast.clone(), config.units, alerts);
    let geocoder = OpenMeteoGeocoder::new(http.clone(), endpoints.geocoding.clone());
    let location = DeviceLocation::new(
        http,
        config.home.clone(),
        endpoints.reverse_geocoding.clone(),
        forecast.clone(),
    );

    Ok(Sources {
        weather: Arc::new(forecast),
        search: Arc::new(geocoder),
        location: Arc::new(location),
    })
}
