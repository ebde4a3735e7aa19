use chrono_tz::Tz;
use std::collections::BTreeSet;

use crate::{
    facet::{Facet, FacetState, FacetValue},
    model::{
        City, CurrentConditions, DayWeather, DewPoint, HourWeather, Humidity, Pressure,
        PressureTrend, Units, UvIndex, WeatherAlert, Wind,
    },
};

/// Identifies one fetch cycle. Increases with every city selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CycleId(pub u64);

impl CycleId {
    pub fn next(self) -> Self {
        CycleId(self.0 + 1)
    }
}

/// Explicit state of a snapshot's fetch cycle, derived from its facets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CyclePhase {
    /// No city selected.
    Idle,
    /// Every facet is still in flight.
    Loading,
    /// Some facets settled; carries those that resolved successfully.
    Partial(BTreeSet<Facet>),
    /// All facets settled and at least one resolved.
    Complete,
    /// All facets settled and none resolved; carries the first failure.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status<'a> {
    NotRequested,
    Pending,
    Ready,
    Failed(&'a str),
}

fn status<T>(state: &FacetState<T>) -> Status<'_> {
    match state {
        FacetState::NotRequested => Status::NotRequested,
        FacetState::Pending => Status::Pending,
        FacetState::Ready(_) => Status::Ready,
        FacetState::Failed(cause) => Status::Failed(cause),
    }
}

/// Every facet of one city for one fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    city: Option<City>,
    cycle: CycleId,
    units: Units,
    pub time_zone: Tz,
    pub current: FacetState<CurrentConditions>,
    pub hourly: FacetState<Vec<HourWeather>>,
    pub daily: FacetState<Vec<DayWeather>>,
    pub humidity: FacetState<Humidity>,
    pub dew_point: FacetState<DewPoint>,
    pub wind: FacetState<Wind>,
    pub uv_index: FacetState<UvIndex>,
    pub pressure: FacetState<Pressure>,
    pub pressure_trend: FacetState<PressureTrend>,
    pub alert: FacetState<Option<WeatherAlert>>,
}

impl WeatherSnapshot {
    /// Snapshot with no city selected.
    pub fn idle(units: Units) -> Self {
        Self {
            city: None,
            cycle: CycleId::default(),
            units,
            time_zone: Tz::UTC,
            current: FacetState::NotRequested,
            hourly: FacetState::NotRequested,
            daily: FacetState::NotRequested,
            humidity: FacetState::NotRequested,
            dew_point: FacetState::NotRequested,
            wind: FacetState::NotRequested,
            uv_index: FacetState::NotRequested,
            pressure: FacetState::NotRequested,
            pressure_trend: FacetState::NotRequested,
            alert: FacetState::NotRequested,
        }
    }

    /// Fresh snapshot for a new cycle, with every facet in flight.
    pub fn pending(city: City, cycle: CycleId, units: Units) -> Self {
        Self {
            city: Some(city),
            cycle,
            units,
            time_zone: Tz::UTC,
            current: FacetState::Pending,
            hourly: FacetState::Pending,
            daily: FacetState::Pending,
            humidity: FacetState::Pending,
            dew_point: FacetState::Pending,
            wind: FacetState::Pending,
            uv_index: FacetState::Pending,
            pressure: FacetState::Pending,
            pressure_trend: FacetState::Pending,
            alert: FacetState::Pending,
        }
    }

    pub fn city(&self) -> Option<&City> {
        self.city.as_ref()
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn resolve(&mut self, value: FacetValue) {
        match value {
            FacetValue::Current(v) => self.current = FacetState::Ready(v),
            FacetValue::Hourly(v) => self.hourly = FacetState::Ready(v),
            FacetValue::Daily(v) => self.daily = FacetState::Ready(v),
            FacetValue::Humidity(v) => self.humidity = FacetState::Ready(v),
            FacetValue::DewPoint(v) => self.dew_point = FacetState::Ready(v),
            FacetValue::Wind(v) => self.wind = FacetState::Ready(v),
            FacetValue::UvIndex(v) => self.uv_index = FacetState::Ready(v),
            FacetValue::Pressure(v) => self.pressure = FacetState::Ready(v),
            FacetValue::PressureTrend(v) => self.pressure_trend = FacetState::Ready(v),
            FacetValue::Alert(v) => self.alert = FacetState::Ready(v),
        }
    }

    pub fn fail(&mut self, facet: Facet, cause: impl Into<String>) {
        let cause = cause.into();
        match facet {
            Facet::Current => self.current = FacetState::Failed(cause),
            Facet::Hourly => self.hourly = FacetState::Failed(cause),
            Facet::Daily => self.daily = FacetState::Failed(cause),
            Facet::Humidity => self.humidity = FacetState::Failed(cause),
            Facet::DewPoint => self.dew_point = FacetState::Failed(cause),
            Facet::Wind => self.wind = FacetState::Failed(cause),
            Facet::UvIndex => self.uv_index = FacetState::Failed(cause),
            Facet::Pressure => self.pressure = FacetState::Failed(cause),
            Facet::PressureTrend => self.pressure_trend = FacetState::Failed(cause),
            Facet::Alert => self.alert = FacetState::Failed(cause),
        }
    }

    /// Marks every facet still in flight as failed with `cause`.
    pub fn fail_pending(&mut self, cause: &str) {
        for facet in self.pending_facets() {
            self.fail(facet, cause);
        }
    }

    fn status(&self, facet: Facet) -> Status<'_> {
        match facet {
            Facet::Current => status(&self.current),
            Facet::Hourly => status(&self.hourly),
            Facet::Daily => status(&self.daily),
            Facet::Humidity => status(&self.humidity),
            Facet::DewPoint => status(&self.dew_point),
            Facet::Wind => status(&self.wind),
            Facet::UvIndex => status(&self.uv_index),
            Facet::Pressure => status(&self.pressure),
            Facet::PressureTrend => status(&self.pressure_trend),
            Facet::Alert => status(&self.alert),
        }
    }

    pub fn is_pending(&self, facet: Facet) -> bool {
        self.status(facet) == Status::Pending
    }

    pub fn failure(&self, facet: Facet) -> Option<&str> {
        match self.status(facet) {
            Status::Failed(cause) => Some(cause),
            _ => None,
        }
    }

    pub fn pending_facets(&self) -> Vec<Facet> {
        Facet::all().iter().copied().filter(|f| self.is_pending(*f)).collect()
    }

    pub fn resolved_facets(&self) -> BTreeSet<Facet> {
        Facet::all()
            .iter()
            .copied()
            .filter(|f| self.status(*f) == Status::Ready)
            .collect()
    }

    pub fn settled_count(&self) -> usize {
        Facet::all()
            .iter()
            .filter(|f| matches!(self.status(**f), Status::Ready | Status::Failed(_)))
            .count()
    }

    /// True from selection until every facet has settled.
    pub fn is_loading(&self) -> bool {
        self.city.is_some() && !self.pending_facets().is_empty()
    }

    pub fn phase(&self) -> CyclePhase {
        if self.city.is_none() {
            return CyclePhase::Idle;
        }

        let resolved = self.resolved_facets();
        if self.is_loading() {
            return if self.settled_count() == 0 {
                CyclePhase::Loading
            } else {
                CyclePhase::Partial(resolved)
            };
        }

        if resolved.is_empty() {
            let cause = Facet::all()
                .iter()
                .find_map(|f| self.failure(*f))
                .unwrap_or("no facets were requested");
            return CyclePhase::Failed(cause.to_string());
        }

        CyclePhase::Complete
    }

    pub fn hourly_series(&self) -> Option<&[HourWeather]> {
        self.hourly.value().map(Vec::as_slice)
    }

    pub fn daily_series(&self) -> Option<&[DayWeather]> {
        self.daily.value().map(Vec::as_slice)
    }

    /// The active alert, if one was fetched and one exists.
    pub fn active_alert(&self) -> Option<&WeatherAlert> {
        self.alert.value().and_then(Option::as_ref)
    }
}
