use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{SourceError, truncate_body},
    model::{
        Coordinate, CurrentConditions, DayWeather, DewPoint, HourWeather, Humidity, Pressure,
        PressureTrend, Units, UvIndex, WeatherAlert, WeatherCondition, Wind,
    },
    provider::nws::NwsAlerts,
};

use super::WeatherSource;

const SERVICE: &str = "Open-Meteo";
const HOURLY_HOURS: &str = "24";
const DAILY_DAYS: &str = "10";
/// Change over the last three hours, in hPa, below which pressure reads as steady.
const PRESSURE_TREND_BAND_HPA: f64 = 1.0;
const HPA_TO_INHG: f64 = 0.029_529_983;

#[derive(Debug, Clone)]
pub struct OpenMeteoSource {
    http: Client,
    base_url: String,
    units: Units,
    alerts: NwsAlerts,
}

impl OpenMeteoSource {
    pub fn new(http: Client, base_url: String, units: Units, alerts: NwsAlerts) -> Self {
        Self { http, base_url, units, alerts }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        at: Coordinate,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let (temperature_unit, wind_speed_unit) = match self.units {
            Units::Metric => ("celsius", "kmh"),
            Units::Imperial => ("fahrenheit", "mph"),
        };
        let latitude = at.latitude.to_string();
        let longitude = at.longitude.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("timezone", "auto"),
            ("timeformat", "unixtime"),
            ("temperature_unit", temperature_unit),
            ("wind_speed_unit", wind_speed_unit),
        ];
        query.extend_from_slice(params);

        tracing::debug!(%at, ?params, "Querying Open-Meteo");

        let res = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|source| SourceError::Request { service: SERVICE, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| SourceError::Request { service: SERVICE, source })?;

        if !status.is_success() {
            return Err(SourceError::Status {
                service: SERVICE,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| SourceError::Parse { service: SERVICE, source })
    }

    async fn current(&self, at: Coordinate, variables: &str) -> Result<OmCurrent, SourceError> {
        let parsed: OmResponse = self.query(at, &[("current", variables)]).await?;
        parsed.current.ok_or_else(|| SourceError::missing(SERVICE, "current"))
    }

    /// IANA time zone of the coordinate, as resolved by the forecast service.
    pub async fn time_zone(&self, at: Coordinate) -> Result<Tz, SourceError> {
        let parsed: OmResponse = self.query(at, &[]).await?;
        let name = parsed.timezone.ok_or_else(|| SourceError::missing(SERVICE, "timezone"))?;
        name.parse::<Tz>().map_err(|_| SourceError::UnknownTimeZone(name))
    }
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    timezone: Option<String>,
    #[serde(default)]
    utc_offset_seconds: i64,
    current: Option<OmCurrent>,
    hourly: Option<OmHourly>,
    daily: Option<OmDaily>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmCurrent {
    time: i64,
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    dew_point_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_gusts_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    uv_index: Option<f64>,
    pressure_msl: Option<f64>,
    weather_code: Option<i32>,
    is_day: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmHourly {
    time: Vec<i64>,
    temperature_2m: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
    precipitation_probability: Vec<Option<f64>>,
    pressure_msl: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmDaily {
    time: Vec<i64>,
    weather_code: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_probability_max: Vec<Option<f64>>,
    sunrise: Vec<Option<i64>>,
    sunset: Vec<Option<i64>>,
}

fn value_at<T: Copy>(values: &[Option<T>], idx: usize) -> Option<T> {
    values.get(idx).copied().flatten()
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn condition(code: Option<i32>) -> WeatherCondition {
    code.map(WeatherCondition::from_wmo_code).unwrap_or_default()
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn hours_from(hourly: OmHourly) -> Vec<HourWeather> {
    hourly
        .time
        .iter()
        .enumerate()
        .filter_map(|(idx, ts)| {
            Some(HourWeather {
                time: unix_to_utc(*ts)?,
                temperature: value_at(&hourly.temperature_2m, idx)?,
                condition: condition(value_at(&hourly.weather_code, idx)),
                precipitation_chance: value_at(&hourly.precipitation_probability, idx).map(percent),
            })
        })
        .collect()
}

fn days_from(daily: OmDaily, utc_offset_seconds: i64) -> Vec<DayWeather> {
    daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(idx, ts)| {
            // Daily timestamps mark local midnight; shift before taking the date.
            let date = unix_to_utc(ts + utc_offset_seconds)?.date_naive();
            Some(DayWeather {
                date,
                high: value_at(&daily.temperature_2m_max, idx)?,
                low: value_at(&daily.temperature_2m_min, idx)?,
                condition: condition(value_at(&daily.weather_code, idx)),
                precipitation_chance: value_at(&daily.precipitation_probability_max, idx).map(percent),
                sunrise: value_at(&daily.sunrise, idx).and_then(unix_to_utc),
                sunset: value_at(&daily.sunset, idx).and_then(unix_to_utc),
            })
        })
        .collect()
}

/// Trend from an oldest-first series of sea-level pressure readings in hPa.
pub fn pressure_trend(series: &[f64]) -> Option<PressureTrend> {
    let (first, last) = (series.first()?, series.last()?);
    let delta = last - first;

    Some(if delta > PRESSURE_TREND_BAND_HPA {
        PressureTrend::Rising
    } else if delta < -PRESSURE_TREND_BAND_HPA {
        PressureTrend::Falling
    } else {
        PressureTrend::Steady
    })
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    async fn current_weather(&self, at: Coordinate) -> Result<CurrentConditions, SourceError> {
        let current = self
            .current(at, "temperature_2m,apparent_temperature,weather_code,is_day")
            .await?;

        Ok(CurrentConditions {
            temperature: current
                .temperature_2m
                .ok_or_else(|| SourceError::missing(SERVICE, "current.temperature_2m"))?,
            apparent_temperature: current
                .apparent_temperature
                .ok_or_else(|| SourceError::missing(SERVICE, "current.apparent_temperature"))?,
            condition: condition(current.weather_code),
            is_daylight: current.is_day.unwrap_or(1) == 1,
            observed_at: unix_to_utc(current.time).unwrap_or_else(Utc::now),
        })
    }

    async fn hourly_forecast(&self, at: Coordinate) -> Result<Vec<HourWeather>, SourceError> {
        let parsed: OmResponse = self
            .query(
                at,
                &[
                    ("hourly", "temperature_2m,weather_code,precipitation_probability"),
                    ("forecast_hours", HOURLY_HOURS),
                ],
            )
            .await?;

        let hourly = parsed.hourly.ok_or_else(|| SourceError::missing(SERVICE, "hourly"))?;
        Ok(hours_from(hourly))
    }

    async fn daily_forecast(&self, at: Coordinate) -> Result<Vec<DayWeather>, SourceError> {
        let parsed: OmResponse = self
            .query(
                at,
                &[
                    (
                        "daily",
                        "weather_code,temperature_2m_max,temperature_2m_min,\
                         precipitation_probability_max,sunrise,sunset",
                    ),
                    ("forecast_days", DAILY_DAYS),
                ],
            )
            .await?;

        let daily = parsed.daily.ok_or_else(|| SourceError::missing(SERVICE, "daily"))?;
        Ok(days_from(daily, parsed.utc_offset_seconds))
    }

    async fn humidity(&self, at: Coordinate) -> Result<Humidity, SourceError> {
        let current = self.current(at, "relative_humidity_2m").await?;
        let value = current
            .relative_humidity_2m
            .ok_or_else(|| SourceError::missing(SERVICE, "current.relative_humidity_2m"))?;
        Ok(Humidity(percent(value)))
    }

    async fn dew_point(&self, at: Coordinate) -> Result<DewPoint, SourceError> {
        let current = self.current(at, "dew_point_2m").await?;
        let value = current
            .dew_point_2m
            .ok_or_else(|| SourceError::missing(SERVICE, "current.dew_point_2m"))?;
        Ok(DewPoint(value))
    }

    async fn wind(&self, at: Coordinate) -> Result<Wind, SourceError> {
        let current = self
            .current(at, "wind_speed_10m,wind_gusts_10m,wind_direction_10m")
            .await?;

        Ok(Wind {
            speed: current
                .wind_speed_10m
                .ok_or_else(|| SourceError::missing(SERVICE, "current.wind_speed_10m"))?,
            gust: current.wind_gusts_10m,
            direction_degrees: current.wind_direction_10m,
        })
    }

    async fn uv_index(&self, at: Coordinate) -> Result<UvIndex, SourceError> {
        let current = self.current(at, "uv_index").await?;
        let value = current
            .uv_index
            .ok_or_else(|| SourceError::missing(SERVICE, "current.uv_index"))?;
        Ok(UvIndex { value: value.round().clamp(0.0, f64::from(u8::MAX)) as u8 })
    }

    async fn pressure(&self, at: Coordinate) -> Result<Pressure, SourceError> {
        let current = self.current(at, "pressure_msl").await?;
        let hpa = current
            .pressure_msl
            .ok_or_else(|| SourceError::missing(SERVICE, "current.pressure_msl"))?;

        let value = match self.units {
            Units::Metric => hpa,
            Units::Imperial => hpa * HPA_TO_INHG,
        };
        Ok(Pressure { value })
    }

    async fn pressure_trend(&self, at: Coordinate) -> Result<PressureTrend, SourceError> {
        let parsed: OmResponse = self
            .query(
                at,
                &[("hourly", "pressure_msl"), ("past_hours", "3"), ("forecast_hours", "1")],
            )
            .await?;

        let hourly = parsed.hourly.ok_or_else(|| SourceError::missing(SERVICE, "hourly"))?;
        let series: Vec<f64> = hourly.pressure_msl.into_iter().flatten().collect();
        pressure_trend(&series).ok_or_else(|| SourceError::missing(SERVICE, "hourly.pressure_msl"))
    }

    async fn active_alert(&self, at: Coordinate) -> Result<Option<WeatherAlert>, SourceError> {
        self.alerts.active_alert(at).await
    }
}
