//! Derived display fields.
//!
//! Everything here is a pure function of snapshot data and is recomputed on
//! every render; nothing is stored.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::{
    model::{DayWeather, HourWeather, Humidity, Pressure, PressureTrend, Units, UvIndex},
    snapshot::WeatherSnapshot,
};

/// Band around the actual temperature inside which "feels like" reads the same.
pub const FEELS_LIKE_BAND: f64 = 1.0;

/// UV values at or above this are shown near the top of the page.
pub const UV_PROMINENT_THRESHOLD: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeelsLike {
    Warmer,
    Cooler,
    Same,
}

impl FeelsLike {
    pub fn classify(apparent: f64, actual: f64) -> Self {
        let delta = apparent - actual;
        if delta > FEELS_LIKE_BAND {
            FeelsLike::Warmer
        } else if delta < -FEELS_LIKE_BAND {
            FeelsLike::Cooler
        } else {
            FeelsLike::Same
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeelsLike::Warmer => "Warmer than actual",
            FeelsLike::Cooler => "Cooler than actual",
            FeelsLike::Same => "About the same as actual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvSeverity {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
    Unknown,
}

impl UvSeverity {
    pub fn from_value(value: Option<u8>) -> Self {
        match value {
            None => UvSeverity::Unknown,
            Some(0..=2) => UvSeverity::Low,
            Some(3..=5) => UvSeverity::Moderate,
            Some(6..=7) => UvSeverity::High,
            Some(8..=10) => UvSeverity::VeryHigh,
            Some(_) => UvSeverity::Extreme,
        }
    }

    pub fn of(uv: Option<&UvIndex>) -> Self {
        Self::from_value(uv.map(|u| u.value))
    }

    pub fn label(&self) -> &'static str {
        match self {
            UvSeverity::Low => "Low",
            UvSeverity::Moderate => "Moderate",
            UvSeverity::High => "High",
            UvSeverity::VeryHigh => "Very High",
            UvSeverity::Extreme => "Extreme",
            UvSeverity::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for UvSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendIcon {
    Equal,
    ArrowUp,
    ArrowDown,
}

impl TrendIcon {
    pub fn for_trend(trend: PressureTrend) -> Self {
        match trend {
            PressureTrend::Steady => TrendIcon::Equal,
            PressureTrend::Rising => TrendIcon::ArrowUp,
            PressureTrend::Falling => TrendIcon::ArrowDown,
        }
    }

    /// Icon for a trend label as reported by a source.
    pub fn for_label(label: &str) -> Self {
        Self::for_trend(PressureTrend::from_label(label))
    }

    pub fn symbol_name(&self) -> &'static str {
        match self {
            TrendIcon::Equal => "equal",
            TrendIcon::ArrowUp => "arrow.up",
            TrendIcon::ArrowDown => "arrow.down",
        }
    }
}

/// Highest and lowest temperature of an hourly series.
pub fn high_low(hourly: &[HourWeather]) -> Option<(f64, f64)> {
    let temps = hourly.iter().map(|h| h.temperature);
    let high = temps.clone().max_by(f64::total_cmp)?;
    let low = temps.min_by(f64::total_cmp)?;
    Some((high, low))
}

/// Rounded whole degrees, without unit. `-0.2` formats as `"0"`.
pub fn format_degrees(value: f64) -> String {
    let rounded = value.round() as i64;
    rounded.to_string()
}

pub fn format_temperature(value: f64) -> String {
    format!("{}°", format_degrees(value))
}

pub fn format_speed(value: f64, units: Units) -> String {
    format!("{} {}", value.round() as i64, units.speed_symbol())
}

pub fn format_pressure(pressure: &Pressure, units: Units) -> String {
    match units {
        Units::Metric => format!("{:.0} {}", pressure.value, units.pressure_symbol()),
        Units::Imperial => format!("{:.2} {}", pressure.value, units.pressure_symbol()),
    }
}

pub fn format_humidity(humidity: Humidity) -> String {
    format!("{}%", humidity.0)
}

/// Time-only formatting in the city's time zone, e.g. `"6:42 AM"`.
pub fn format_time(instant: DateTime<Utc>, time_zone: Tz) -> String {
    instant.with_timezone(&time_zone).format("%-I:%M %p").to_string()
}

/// Sunrise and sunset for today and tomorrow.
#[derive(Debug, Clone, PartialEq)]
pub struct SunTimes {
    pub sunrise: String,
    pub sunset: String,
    pub today_sunrise: DateTime<Utc>,
    pub today_sunset: DateTime<Utc>,
    pub next_sunrise: DateTime<Utc>,
    pub next_sunset: DateTime<Utc>,
}

/// Requires at least two daily entries with all four instants present.
pub fn sun_times(daily: &[DayWeather], time_zone: Tz) -> Option<SunTimes> {
    let [today, tomorrow, ..] = daily else {
        return None;
    };

    let today_sunrise = today.sunrise?;
    let today_sunset = today.sunset?;

    Some(SunTimes {
        sunrise: format_time(today_sunrise, time_zone),
        sunset: format_time(today_sunset, time_zone),
        today_sunrise,
        today_sunset,
        next_sunrise: tomorrow.sunrise?,
        next_sunset: tomorrow.sunset?,
    })
}

/// Derived strings and flags of one snapshot, as a renderer consumes them.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFields {
    pub high_temperature: Option<String>,
    pub low_temperature: Option<String>,
    pub feels_like: Option<FeelsLike>,
    pub uv_value: Option<u8>,
    pub uv_severity: UvSeverity,
    pub humidity: Option<String>,
    pub dew_point: Option<String>,
    pub wind_speed: Option<String>,
    pub wind_gust: Option<String>,
    pub pressure: Option<String>,
    pub pressure_trend: Option<PressureTrend>,
    pub trend_icon: Option<TrendIcon>,
    pub sun: Option<SunTimes>,
}

impl DisplayFields {
    pub fn derive(snapshot: &WeatherSnapshot) -> Self {
        let units = snapshot.units();
        let (high, low) = match snapshot.hourly_series().and_then(high_low) {
            Some((high, low)) => (Some(high), Some(low)),
            None => (None, None),
        };
        let wind = snapshot.wind.value();
        let trend = snapshot.pressure_trend.value().copied();
        let uv = snapshot.uv_index.value();

        Self {
            high_temperature: high.map(format_degrees),
            low_temperature: low.map(format_degrees),
            feels_like: snapshot
                .current
                .value()
                .map(|c| FeelsLike::classify(c.apparent_temperature, c.temperature)),
            uv_value: uv.map(|u| u.value),
            uv_severity: UvSeverity::of(uv),
            humidity: snapshot.humidity.value().copied().map(format_humidity),
            dew_point: snapshot.dew_point.value().map(|d| format_temperature(d.0)),
            wind_speed: wind.map(|w| format_speed(w.speed, units)),
            wind_gust: wind.and_then(|w| w.gust).map(|g| format_speed(g, units)),
            pressure: snapshot.pressure.value().map(|p| format_pressure(p, units)),
            pressure_trend: trend,
            trend_icon: trend.map(TrendIcon::for_trend),
            sun: snapshot
                .daily_series()
                .and_then(|daily| sun_times(daily, snapshot.time_zone)),
        }
    }
}
