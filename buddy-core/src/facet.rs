//! Per-facet fetch state.
//!
//! A facet is one independently fetched weather attribute. Each facet of a
//! snapshot carries its own [`FacetState`], so "not asked yet", "in flight",
//! "failed" and "present" stay distinguishable.

use std::fmt;

use crate::model::{
    CurrentConditions, DayWeather, DewPoint, HourWeather, Humidity, Pressure, PressureTrend,
    UvIndex, WeatherAlert, Wind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Current,
    Hourly,
    Daily,
    Humidity,
    DewPoint,
    Wind,
    UvIndex,
    Pressure,
    PressureTrend,
    Alert,
}

impl Facet {
    /// All facets in the order a fetch cycle issues them.
    pub const fn all() -> &'static [Facet] {
        &[
            Facet::Current,
            Facet::Hourly,
            Facet::Daily,
            Facet::Humidity,
            Facet::DewPoint,
            Facet::Wind,
            Facet::UvIndex,
            Facet::Pressure,
            Facet::PressureTrend,
            Facet::Alert,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Current => "current",
            Facet::Hourly => "hourly",
            Facet::Daily => "daily",
            Facet::Humidity => "humidity",
            Facet::DewPoint => "dew_point",
            Facet::Wind => "wind",
            Facet::UvIndex => "uv_index",
            Facet::Pressure => "pressure",
            Facet::PressureTrend => "pressure_trend",
            Facet::Alert => "alert",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FacetState<T> {
    #[default]
    NotRequested,
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> FacetState<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            FacetState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, FacetState::Pending)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, FacetState::Ready(_) | FacetState::Failed(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            FacetState::Failed(cause) => Some(cause),
            _ => None,
        }
    }
}

/// A successfully fetched facet value on its way into a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetValue {
    Current(CurrentConditions),
    Hourly(Vec<HourWeather>),
    Daily(Vec<DayWeather>),
    Humidity(Humidity),
    DewPoint(DewPoint),
    Wind(Wind),
    UvIndex(UvIndex),
    Pressure(Pressure),
    PressureTrend(PressureTrend),
    Alert(Option<WeatherAlert>),
}

impl FacetValue {
    pub fn facet(&self) -> Facet {
        match self {
            FacetValue::Current(_) => Facet::Current,
            FacetValue::Hourly(_) => Facet::Hourly,
            FacetValue::Daily(_) => Facet::Daily,
            FacetValue::Humidity(_) => Facet::Humidity,
            FacetValue::DewPoint(_) => Facet::DewPoint,
            FacetValue::Wind(_) => Facet::Wind,
            FacetValue::UvIndex(_) => Facet::UvIndex,
            FacetValue::Pressure(_) => Facet::Pressure,
            FacetValue::PressureTrend(_) => Facet::PressureTrend,
            FacetValue::Alert(_) => Facet::Alert,
        }
    }
}
