//! Which page sections a snapshot renders, in page order.

use crate::{
    display::{DisplayFields, FeelsLike, SunTimes, TrendIcon, UV_PROMINENT_THRESHOLD, UvSeverity},
    model::{CurrentConditions, DayWeather, HourWeather, PressureTrend, WeatherAlert},
    snapshot::{CyclePhase, WeatherSnapshot},
};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvPlacement {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Header { city: String },
    Loading,
    Current {
        conditions: CurrentConditions,
        high: Option<String>,
        low: Option<String>,
    },
    Alert { summary: String, source: String, details: Url },
    UvIndex { value: u8, severity: UvSeverity, placement: UvPlacement },
    Hourly(Vec<HourWeather>),
    Daily(Vec<DayWeather>),
    Sun(SunTimes),
    Humidity { humidity: String, dew_point: String },
    Wind { speed: String, gust: String },
    FeelsLike { apparent: f64, feels: FeelsLike },
    Pressure { value: String, trend: PressureTrend, icon: TrendIcon },
    Attribution,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::Header { .. } => "header",
            Section::Loading => "loading",
            Section::Current { .. } => "current",
            Section::Alert { .. } => "alert",
            Section::UvIndex { .. } => "uv_index",
            Section::Hourly(_) => "hourly",
            Section::Daily(_) => "daily",
            Section::Sun(_) => "sun",
            Section::Humidity { .. } => "humidity",
            Section::Wind { .. } => "wind",
            Section::FeelsLike { .. } => "feels_like",
            Section::Pressure { .. } => "pressure",
            Section::Attribution => "attribution",
        }
    }
}

/// Sections for `snapshot`. An idle snapshot renders nothing; a cycle where no
/// facet has settled yet renders the header and a loading indicator only.
pub fn sections(snapshot: &WeatherSnapshot) -> Vec<Section> {
    let Some(city) = snapshot.city() else {
        return Vec::new();
    };

    let mut out = vec![Section::Header { city: city.name().to_string() }];
    if snapshot.phase() == CyclePhase::Loading {
        out.push(Section::Loading);
        return out;
    }

    let fields = DisplayFields::derive(snapshot);
    let uv = uv_section(&fields);

    if let Some(conditions) = snapshot.current.value() {
        out.push(Section::Current {
            conditions: conditions.clone(),
            high: fields.high_temperature.clone(),
            low: fields.low_temperature.clone(),
        });
    }

    if let Some(WeatherAlert { summary, source: Some(source), details_url: Some(details) }) =
        snapshot.active_alert()
    {
        out.push(Section::Alert {
            summary: summary.clone(),
            source: source.clone(),
            details: details.clone(),
        });
    }

    if let Some(section @ Section::UvIndex { placement: UvPlacement::Top, .. }) = &uv {
        out.push(section.clone());
    }

    if let Some(hourly) = snapshot.hourly.value() {
        out.push(Section::Hourly(hourly.clone()));
    }
    if let Some(daily) = snapshot.daily.value() {
        out.push(Section::Daily(daily.clone()));
    }

    if let Some(sun) = fields.sun.clone() {
        out.push(Section::Sun(sun));
    }

    if let (Some(humidity), Some(dew_point)) = (&fields.humidity, &fields.dew_point) {
        out.push(Section::Humidity { humidity: humidity.clone(), dew_point: dew_point.clone() });
    }

    if let (Some(speed), Some(gust)) = (&fields.wind_speed, &fields.wind_gust) {
        out.push(Section::Wind { speed: speed.clone(), gust: gust.clone() });
    }

    if let (Some(conditions), Some(feels)) = (snapshot.current.value(), fields.feels_like) {
        out.push(Section::FeelsLike { apparent: conditions.apparent_temperature, feels });
    }

    if let Some(section @ Section::UvIndex { placement: UvPlacement::Bottom, .. }) = &uv {
        out.push(section.clone());
    }

    if let (Some(value), Some(trend), Some(icon)) =
        (&fields.pressure, fields.pressure_trend, fields.trend_icon)
    {
        out.push(Section::Pressure { value: value.clone(), trend, icon });
    }

    out.push(Section::Attribution);
    out
}

fn uv_section(fields: &DisplayFields) -> Option<Section> {
    let value = fields.uv_value?;
    let placement =
        if value >= UV_PROMINENT_THRESHOLD { UvPlacement::Top } else { UvPlacement::Bottom };

    Some(Section::UvIndex { value, severity: fields.uv_severity, placement })
}
