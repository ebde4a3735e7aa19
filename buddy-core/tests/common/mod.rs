//! Hand-written doubles for the provider traits.

#![allow(dead_code)]

use async_trait::async_trait;
use buddy_core::{
    City, Coordinate, Facet, SourceError,
    model::{
        CurrentConditions, DayWeather, DewPoint, HourWeather, Humidity, PlaceCandidate, PlaceQuery,
        Pressure, PressureTrend, UvIndex, WeatherAlert, WeatherCondition, Wind,
    },
    provider::{LocationSource, PlaceSearch, WeatherSource},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::watch;

pub fn nyc() -> City {
    City::new("New York", 40.71, -74.01)
}

pub fn london() -> City {
    City::new("London", 51.51, -0.13)
}

fn key(at: Coordinate) -> (i64, i64) {
    ((at.latitude * 1e4).round() as i64, (at.longitude * 1e4).round() as i64)
}

fn base_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_726_300_800, 0).unwrap_or_default()
}

/// Canned answers for one place.
#[derive(Debug, Clone)]
pub struct Script {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub hourly_temperatures: Vec<f64>,
    pub humidity: u8,
    pub dew_point: f64,
    pub wind_speed: f64,
    pub wind_gust: Option<f64>,
    pub uv: u8,
    pub pressure: f64,
    pub trend: PressureTrend,
    pub alert: Option<WeatherAlert>,
    pub failing: Vec<Facet>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            temperature: 62.0,
            apparent_temperature: 62.0,
            hourly_temperatures: vec![60.0, 65.0, 58.0],
            humidity: 62,
            dew_point: 49.0,
            wind_speed: 12.0,
            wind_gust: Some(20.0),
            uv: 3,
            pressure: 29.92,
            trend: PressureTrend::Steady,
            alert: None,
            failing: Vec::new(),
        }
    }
}

/// Scripted weather source. Requests for a gated place wait until the gate
/// opens.
#[derive(Debug, Default)]
pub struct ScriptedWeather {
    scripts: Mutex<HashMap<(i64, i64), Script>>,
    gates: Mutex<HashMap<(i64, i64), watch::Receiver<bool>>>,
    calls: AtomicUsize,
}

impl ScriptedWeather {
    pub fn with(city: &City, script: Script) -> Self {
        let source = Self::default();
        source.script(city, script);
        source
    }

    pub fn script(&self, city: &City, script: Script) {
        self.scripts.lock().insert(key(city.coordinate()), script);
    }

    /// Holds every request for `city` until the returned sender sends `true`.
    pub fn gate(&self, city: &City) -> watch::Sender<bool> {
        let (tx, rx) = watch::channel(false);
        self.gates.lock().insert(key(city.coordinate()), rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, at: Coordinate, facet: Facet) -> Result<Script, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().get(&key(at)).cloned();
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }

        let script = self.scripts.lock().get(&key(at)).cloned().unwrap_or_default();
        if script.failing.contains(&facet) {
            return Err(SourceError::MissingField { service: "scripted", field: facet.as_str() });
        }
        Ok(script)
    }
}

#[async_trait]
impl WeatherSource for ScriptedWeather {
    async fn current_weather(&self, at: Coordinate) -> Result<CurrentConditions, SourceError> {
        let s = self.answer(at, Facet::Current).await?;
        Ok(CurrentConditions {
            temperature: s.temperature,
            apparent_temperature: s.apparent_temperature,
            condition: WeatherCondition::PartlyCloudy,
            is_daylight: true,
            observed_at: base_time(),
        })
    }

    async fn hourly_forecast(&self, at: Coordinate) -> Result<Vec<HourWeather>, SourceError> {
        let s = self.answer(at, Facet::Hourly).await?;
        Ok(s.hourly_temperatures
            .iter()
            .zip(0i64..)
            .map(|(temperature, hour)| HourWeather {
                time: base_time() + Duration::hours(hour),
                temperature: *temperature,
                condition: WeatherCondition::Clear,
                precipitation_chance: Some(10),
            })
            .collect())
    }

    async fn daily_forecast(&self, at: Coordinate) -> Result<Vec<DayWeather>, SourceError> {
        self.answer(at, Facet::Daily).await?;
        let day = |offset: u32, sunrise: i64, sunset: i64| DayWeather {
            date: NaiveDate::from_ymd_opt(2024, 9, 14 + offset).unwrap_or_default(),
            high: 70.0,
            low: 55.0,
            condition: WeatherCondition::Clear,
            precipitation_chance: None,
            sunrise: DateTime::from_timestamp(sunrise, 0),
            sunset: DateTime::from_timestamp(sunset, 0),
        };
        // 2024-09-14 06:42 and 19:05 in New York, then the next day.
        Ok(vec![
            day(0, 1_726_310_520, 1_726_355_100),
            day(1, 1_726_396_980, 1_726_441_380),
        ])
    }

    async fn humidity(&self, at: Coordinate) -> Result<Humidity, SourceError> {
        Ok(Humidity(self.answer(at, Facet::Humidity).await?.humidity))
    }

    async fn dew_point(&self, at: Coordinate) -> Result<DewPoint, SourceError> {
        Ok(DewPoint(self.answer(at, Facet::DewPoint).await?.dew_point))
    }

    async fn wind(&self, at: Coordinate) -> Result<Wind, SourceError> {
        let s = self.answer(at, Facet::Wind).await?;
        Ok(Wind { speed: s.wind_speed, gust: s.wind_gust, direction_degrees: Some(270.0) })
    }

    async fn uv_index(&self, at: Coordinate) -> Result<UvIndex, SourceError> {
        Ok(UvIndex { value: self.answer(at, Facet::UvIndex).await?.uv })
    }

    async fn pressure(&self, at: Coordinate) -> Result<Pressure, SourceError> {
        Ok(Pressure { value: self.answer(at, Facet::Pressure).await?.pressure })
    }

    async fn pressure_trend(&self, at: Coordinate) -> Result<PressureTrend, SourceError> {
        Ok(self.answer(at, Facet::PressureTrend).await?.trend)
    }

    async fn active_alert(&self, at: Coordinate) -> Result<Option<WeatherAlert>, SourceError> {
        Ok(self.answer(at, Facet::Alert).await?.alert)
    }
}

/// Location source with a fixed device city and time zone.
#[derive(Debug, Default)]
pub struct FixedLocation {
    pub city: Option<City>,
    pub time_zone: Option<Tz>,
}

impl FixedLocation {
    pub fn new_york() -> Self {
        Self { city: Some(nyc()), time_zone: Some(chrono_tz::America::New_York) }
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_city(&self) -> Result<City, SourceError> {
        self.city.clone().ok_or(SourceError::LocationUnavailable)
    }

    async fn timezone(&self, _: Coordinate) -> Result<Tz, SourceError> {
        self.time_zone.ok_or_else(|| SourceError::UnknownTimeZone("unset".into()))
    }
}

/// Place search answering from a fixed table keyed by fragment. Fragments
/// with a gate wait until it opens.
#[derive(Debug, Default)]
pub struct ScriptedSearch {
    answers: Mutex<HashMap<String, Vec<PlaceCandidate>>>,
    gates: Mutex<HashMap<String, watch::Receiver<bool>>>,
    failing: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn answer(&self, fragment: &str, candidates: Vec<PlaceCandidate>) {
        self.answers.lock().insert(fragment.to_string(), candidates);
    }

    pub fn fail(&self, fragment: &str) {
        self.failing.lock().push(fragment.to_string());
    }

    pub fn gate(&self, fragment: &str) -> watch::Sender<bool> {
        let (tx, rx) = watch::channel(false);
        self.gates.lock().insert(fragment.to_string(), rx);
        tx
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl PlaceSearch for ScriptedSearch {
    async fn search(&self, query: &PlaceQuery) -> Result<Vec<PlaceCandidate>, SourceError> {
        self.queries.lock().push(query.fragment.clone());

        let gate = self.gates.lock().get(&query.fragment).cloned();
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }

        if self.failing.lock().contains(&query.fragment) {
            return Err(SourceError::MissingField { service: "scripted", field: "results" });
        }
        Ok(self.answers.lock().get(&query.fragment).cloned().unwrap_or_default())
    }
}

pub fn candidate(title: &str, coordinate: Option<(f64, f64)>) -> PlaceCandidate {
    PlaceCandidate {
        title: title.to_string(),
        coordinate: coordinate.map(|(lat, lon)| Coordinate::new(lat, lon)),
    }
}
