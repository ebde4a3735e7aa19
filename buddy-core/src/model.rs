use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};
use url::Url;

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A selectable place. Fields are fixed once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    name: String,
    latitude: f64,
    longitude: f64,
}

impl City {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self { name: name.into(), latitude, longitude }
    }

    pub fn at(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self::new(name, coordinate.latitude, coordinate.longitude)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Raw place-search match. `coordinate` is `None` when the engine could not
/// resolve the match to a location.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub title: String,
    pub coordinate: Option<Coordinate>,
}

impl PlaceCandidate {
    /// Resolve into a [`City`], or `None` if the match has no coordinate.
    pub fn into_city(self) -> Option<City> {
        let coordinate = self.coordinate?;
        Some(City::at(self.title, coordinate))
    }
}

/// Kind of match a place search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultType {
    #[default]
    Address,
    PointOfInterest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceQuery {
    pub fragment: String,
    pub result_type: ResultType,
}

impl PlaceQuery {
    pub fn address(fragment: impl Into<String>) -> Self {
        Self { fragment: fragment.into(), result_type: ResultType::Address }
    }
}

/// Measurement system used for requests and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    #[default]
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "km/h",
            Units::Imperial => "mph",
        }
    }

    pub fn pressure_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "hPa",
            Units::Imperial => "inHg",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: metric, imperial."
            )),
        }
    }
}

/// Weather condition categories mapped from WMO codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    MostlyClear,
    PartlyCloudy,
    Cloudy,
    Foggy,
    Drizzle,
    Rain,
    HeavyRain,
    FreezingRain,
    Snow,
    Thunderstorms,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1 => Self::MostlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Foggy,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 | 66 | 67 => Self::FreezingRain,
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorms,
            _ => Self::Unknown,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::MostlyClear => "Mostly Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Foggy => "Foggy",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::FreezingRain => "Freezing Rain",
            Self::Snow => "Snow",
            Self::Thunderstorms => "Thunderstorms",
            Self::Unknown => "Unknown",
        }
    }

    /// Symbol name used by renderers to pick an icon.
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun.max",
            Self::MostlyClear | Self::PartlyCloudy => "cloud.sun",
            Self::Cloudy => "cloud",
            Self::Foggy => "cloud.fog",
            Self::Drizzle => "cloud.drizzle",
            Self::Rain | Self::HeavyRain => "cloud.rain",
            Self::FreezingRain => "cloud.sleet",
            Self::Snow => "cloud.snow",
            Self::Thunderstorms => "cloud.bolt.rain",
            Self::Unknown => "questionmark",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub condition: WeatherCondition,
    pub is_daylight: bool,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourWeather {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub condition: WeatherCondition,
    pub precipitation_chance: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayWeather {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: WeatherCondition,
    pub precipitation_chance: Option<u8>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

/// Relative humidity in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Humidity(pub u8);

/// Dew point, in the temperature unit of the request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DewPoint(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub gust: Option<f64>,
    pub direction_degrees: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pressure {
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureTrend {
    Steady,
    Rising,
    Falling,
}

impl PressureTrend {
    pub fn label(&self) -> &'static str {
        match self {
            PressureTrend::Steady => "Steady",
            PressureTrend::Rising => "Rising",
            PressureTrend::Falling => "Falling",
        }
    }

    /// "Steady" and "Rising" match exactly; any other label reads as falling.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Steady" => PressureTrend::Steady,
            "Rising" => PressureTrend::Rising,
            _ => PressureTrend::Falling,
        }
    }
}

impl fmt::Display for PressureTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UvIndex {
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub summary: String,
    pub source: Option<String>,
    pub details_url: Option<Url>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unknown_units_error() {
        let err = Units::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown units"));
    }

    #[test]
    fn candidate_without_coordinate_does_not_resolve() {
        let candidate = PlaceCandidate { title: "Nowhere".into(), coordinate: None };
        assert!(candidate.into_city().is_none());
    }

    #[test]
    fn candidate_with_coordinate_becomes_city() {
        let candidate = PlaceCandidate {
            title: "San Diego, California, United States".into(),
            coordinate: Some(Coordinate::new(32.72, -117.16)),
        };
        let city = candidate.into_city().expect("coordinate present");
        assert_eq!(city.name(), "San Diego, California, United States");
        assert_eq!(city.coordinate(), Coordinate::new(32.72, -117.16));
    }

    #[test]
    fn pressure_trend_labels() {
        assert_eq!(PressureTrend::from_label("Steady"), PressureTrend::Steady);
        assert_eq!(PressureTrend::from_label("Rising"), PressureTrend::Rising);
        assert_eq!(PressureTrend::from_label("Falling"), PressureTrend::Falling);
        assert_eq!(PressureTrend::from_label("Dropping"), PressureTrend::Falling);
    }

    #[test]
    fn wmo_codes_map_to_conditions() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(48), WeatherCondition::Foggy);
        assert_eq!(WeatherCondition::from_wmo_code(66), WeatherCondition::FreezingRain);
        assert_eq!(WeatherCondition::from_wmo_code(99), WeatherCondition::Thunderstorms);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Unknown);
    }
}
