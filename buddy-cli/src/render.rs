//! Plain-text rendering of a snapshot's sections.

use buddy_core::{
    Facet, WeatherSnapshot,
    display::{TrendIcon, format_degrees, format_temperature, format_time},
    layout::{self, Section},
};
use std::fmt;

const HOURS_SHOWN: usize = 12;

/// A whole forecast page for one snapshot.
pub struct Page<'a>(pub &'a WeatherSnapshot);

impl fmt::Display for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        for section in layout::sections(snapshot) {
            write_section(f, &section, snapshot)?;
        }

        for facet in Facet::all() {
            if let Some(cause) = snapshot.failure(*facet) {
                writeln!(f, "  ! {facet} unavailable: {cause}")?;
            }
        }
        Ok(())
    }
}

fn trend_glyph(icon: TrendIcon) -> &'static str {
    match icon {
        TrendIcon::Equal => "=",
        TrendIcon::ArrowUp => "↑",
        TrendIcon::ArrowDown => "↓",
    }
}

fn write_section(
    f: &mut fmt::Formatter<'_>,
    section: &Section,
    snapshot: &WeatherSnapshot,
) -> fmt::Result {
    let tz = snapshot.time_zone;
    let units = snapshot.units();

    match section {
        Section::Header { city } => {
            writeln!(f, "{city}")?;
            writeln!(f, "{}", "=".repeat(city.chars().count()))
        }
        Section::Loading => writeln!(f, "Loading..."),
        Section::Current { conditions, high, low } => {
            writeln!(
                f,
                "{}{}  {}",
                format_degrees(conditions.temperature),
                units.temperature_symbol(),
                conditions.condition.description()
            )?;
            if let (Some(high), Some(low)) = (high, low) {
                writeln!(f, "H:{high}°  L:{low}°")?;
            }
            Ok(())
        }
        Section::Alert { summary, source, details } => {
            writeln!(f)?;
            writeln!(f, "ALERT  {summary}")?;
            writeln!(f, "       {source}: {details}")
        }
        Section::UvIndex { value, severity, .. } => {
            writeln!(f)?;
            writeln!(f, "UV index     {value} ({severity})")
        }
        Section::Hourly(hours) => {
            writeln!(f)?;
            writeln!(f, "Hourly")?;
            for hour in hours.iter().take(HOURS_SHOWN) {
                let chance = hour
                    .precipitation_chance
                    .map(|p| format!("  {p}%"))
                    .unwrap_or_default();
                writeln!(
                    f,
                    "  {:>8}  {:>4}  {}{chance}",
                    format_time(hour.time, tz),
                    format_temperature(hour.temperature),
                    hour.condition.description()
                )?;
            }
            Ok(())
        }
        Section::Daily(days) => {
            writeln!(f)?;
            writeln!(f, "Daily")?;
            for day in days {
                writeln!(
                    f,
                    "  {}  {:>4} / {:<4}  {}",
                    day.date.format("%a %e %b"),
                    format_temperature(day.low),
                    format_temperature(day.high),
                    day.condition.description()
                )?;
            }
            Ok(())
        }
        Section::Sun(sun) => {
            writeln!(f)?;
            writeln!(f, "Sunrise      {}", sun.sunrise)?;
            writeln!(f, "Sunset       {}", sun.sunset)
        }
        Section::Humidity { humidity, dew_point } => {
            writeln!(f, "Humidity     {humidity}  (dew point {dew_point})")
        }
        Section::Wind { speed, gust } => writeln!(f, "Wind         {speed}  (gusts {gust})"),
        Section::FeelsLike { apparent, feels } => {
            writeln!(f, "Feels like   {}  {}", format_temperature(*apparent), feels.label())
        }
        Section::Pressure { value, trend, icon } => {
            writeln!(f, "Pressure     {value} {} {trend}", trend_glyph(*icon))
        }
        Section::Attribution => {
            writeln!(f)?;
            writeln!(f, "Weather data by Open-Meteo.com. Alerts by the U.S. National Weather Service.")
        }
    }
}
