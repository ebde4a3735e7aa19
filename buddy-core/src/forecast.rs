//! Forecast presentation controller.
//!
//! Selecting a city starts a fetch cycle: the ten facets and the city's time
//! zone are requested concurrently and each result lands in the shared
//! [`WeatherSnapshot`] as soon as it resolves. Starting a new cycle cancels the
//! previous one, and writes are checked against the current cycle id, so a
//! slow answer for an old city can never overwrite the new city's facets.

use chrono_tz::Tz;
use futures::{FutureExt, StreamExt, future::BoxFuture, stream::FuturesUnordered};
use parking_lot::Mutex;
use std::{future::Future, sync::Arc};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    error::SourceError,
    facet::{Facet, FacetValue},
    model::{City, Coordinate, Units},
    provider::{LocationSource, WeatherSource},
    snapshot::{CycleId, CyclePhase, WeatherSnapshot},
};

const EVENT_CAPACITY: usize = 64;

/// Published on every change to the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    CycleStarted { cycle: CycleId, city: City },
    FacetSettled { cycle: CycleId, facet: Facet, ok: bool },
    TimeZoneResolved { cycle: CycleId, time_zone: Tz },
    CycleFinished { cycle: CycleId, phase: CyclePhase },
}

#[derive(Debug)]
enum Outcome {
    Facet(Facet, Result<FacetValue, SourceError>),
    TimeZone(Result<Tz, SourceError>),
}

#[derive(Debug)]
struct ControllerState {
    snapshot: WeatherSnapshot,
    cancel: Option<CancellationToken>,
    /// Cycle whose results are still applied. Cleared by `cancel` and on finish.
    live: Option<CycleId>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<ControllerState>,
    events: broadcast::Sender<SnapshotEvent>,
}

/// Handle on a running fetch cycle.
#[derive(Debug)]
pub struct FetchCycle {
    id: CycleId,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl FetchCycle {
    pub fn id(&self) -> CycleId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits until every request of the cycle settled or the cycle was cancelled.
    pub async fn settled(self) {
        if let Err(e) = self.task.await {
            tracing::error!(cycle = self.id.0, error = %e, "Fetch cycle task failed");
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForecastController {
    weather: Arc<dyn WeatherSource>,
    location: Arc<dyn LocationSource>,
    units: Units,
    shared: Arc<Shared>,
}

impl ForecastController {
    pub fn new(
        weather: Arc<dyn WeatherSource>,
        location: Arc<dyn LocationSource>,
        units: Units,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state =
            ControllerState { snapshot: WeatherSnapshot::idle(units), cancel: None, live: None };

        Self { weather, location, units, shared: Arc::new(Shared { state: Mutex::new(state), events }) }
    }

    pub fn snapshot(&self) -> WeatherSnapshot {
        self.shared.state.lock().snapshot.clone()
    }

    pub fn selected_city(&self) -> Option<City> {
        self.shared.state.lock().snapshot.city().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().snapshot.is_loading()
    }

    pub fn phase(&self) -> CyclePhase {
        self.shared.state.lock().snapshot.phase()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotEvent> {
        self.shared.events.subscribe()
    }

    /// Replaces the snapshot with an empty one for `city` and starts fetching.
    /// Must be called from within a Tokio runtime.
    pub fn select_city(&self, city: City) -> FetchCycle {
        let token = CancellationToken::new();
        let cycle = {
            let mut state = self.shared.state.lock();
            if let Some(previous) = state.cancel.replace(token.clone()) {
                previous.cancel();
            }
            let cycle = state.snapshot.cycle().next();
            state.snapshot = WeatherSnapshot::pending(city.clone(), cycle, self.units);
            state.live = Some(cycle);
            cycle
        };

        tracing::info!(%city, cycle = cycle.0, "Fetching weather");
        self.publish(SnapshotEvent::CycleStarted { cycle, city: city.clone() });

        let runner = self.clone();
        let cycle_token = token.clone();
        let task = tokio::spawn(async move {
            runner.run_cycle(cycle, city.coordinate(), cycle_token).await;
        });

        FetchCycle { id: cycle, token, task }
    }

    /// Selects `city` and waits for its cycle to settle. If another city is
    /// selected in the meantime, the returned snapshot is that city's.
    pub async fn fetch_weather(&self, city: City) -> WeatherSnapshot {
        self.select_city(city).settled().await;
        self.snapshot()
    }

    /// A new device position only selects a city when none is selected yet.
    pub fn on_location_update(&self, city: City) -> Option<FetchCycle> {
        if self.selected_city().is_some() {
            return None;
        }
        Some(self.select_city(city))
    }

    /// Re-resolves the device location and starts a cycle for it, replacing
    /// whatever was selected.
    pub async fn refresh_from_device(&self) -> Result<FetchCycle, SourceError> {
        let city = self.location.current_city().await?;
        Ok(self.select_city(city))
    }

    /// Stops the running cycle. Facets still in flight are marked failed.
    pub fn cancel(&self) {
        let finished = {
            let mut state = self.shared.state.lock();
            let Some(token) = state.cancel.take() else {
                return;
            };
            token.cancel();
            state.live = None;

            if !state.snapshot.is_loading() {
                return;
            }
            state.snapshot.fail_pending("cancelled");
            (state.snapshot.cycle(), state.snapshot.phase())
        };

        let (cycle, phase) = finished;
        tracing::info!(cycle = cycle.0, "Fetch cycle cancelled");
        self.publish(SnapshotEvent::CycleFinished { cycle, phase });
    }

    async fn run_cycle(&self, cycle: CycleId, at: Coordinate, token: CancellationToken) {
        let mut pending: FuturesUnordered<_> = self.requests(at).into_iter().collect();

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(cycle = cycle.0, "Fetch cycle superseded");
                    return;
                }
                next = pending.next() => match next {
                    Some(outcome) => self.apply(cycle, outcome),
                    None => break,
                },
            }
        }

        self.finish(cycle);
    }

    /// Requests in declared order: current conditions, time zone, then the
    /// remaining facets.
    fn requests(&self, at: Coordinate) -> Vec<BoxFuture<'_, Outcome>> {
        let weather = &self.weather;
        let location = &self.location;

        vec![
            facet(Facet::Current, FacetValue::Current, weather.current_weather(at)),
            async move { Outcome::TimeZone(location.timezone(at).await) }.boxed(),
            facet(Facet::Hourly, FacetValue::Hourly, weather.hourly_forecast(at)),
            facet(Facet::Daily, FacetValue::Daily, weather.daily_forecast(at)),
            facet(Facet::Humidity, FacetValue::Humidity, weather.humidity(at)),
            facet(Facet::DewPoint, FacetValue::DewPoint, weather.dew_point(at)),
            facet(Facet::Wind, FacetValue::Wind, weather.wind(at)),
            facet(Facet::UvIndex, FacetValue::UvIndex, weather.uv_index(at)),
            facet(Facet::Pressure, FacetValue::Pressure, weather.pressure(at)),
            facet(Facet::PressureTrend, FacetValue::PressureTrend, weather.pressure_trend(at)),
            facet(Facet::Alert, FacetValue::Alert, weather.active_alert(at)),
        ]
    }

    fn apply(&self, cycle: CycleId, outcome: Outcome) {
        let event = {
            let mut state = self.shared.state.lock();
            if state.live != Some(cycle) {
                tracing::debug!(
                    cycle = cycle.0,
                    current = state.snapshot.cycle().0,
                    "Discarding result of superseded or cancelled cycle"
                );
                return;
            }

            match outcome {
                Outcome::Facet(facet, Ok(value)) => {
                    tracing::debug!(%facet, cycle = cycle.0, "Facet resolved");
                    state.snapshot.resolve(value);
                    SnapshotEvent::FacetSettled { cycle, facet, ok: true }
                }
                Outcome::Facet(facet, Err(e)) => {
                    tracing::warn!(%facet, cycle = cycle.0, error = %e, "Facet fetch failed");
                    state.snapshot.fail(facet, e.to_string());
                    SnapshotEvent::FacetSettled { cycle, facet, ok: false }
                }
                Outcome::TimeZone(Ok(time_zone)) => {
                    state.snapshot.time_zone = time_zone;
                    SnapshotEvent::TimeZoneResolved { cycle, time_zone }
                }
                Outcome::TimeZone(Err(e)) => {
                    tracing::warn!(cycle = cycle.0, error = %e, "Time zone lookup failed, using UTC");
                    return;
                }
            }
        };

        self.publish(event);
    }

    fn finish(&self, cycle: CycleId) {
        let phase = {
            let mut state = self.shared.state.lock();
            if state.live != Some(cycle) {
                return;
            }
            state.live = None;
            state.snapshot.phase()
        };

        tracing::info!(cycle = cycle.0, ?phase, "Fetch cycle finished");
        self.publish(SnapshotEvent::CycleFinished { cycle, phase });
    }

    fn publish(&self, event: SnapshotEvent) {
        // No subscribers is fine.
        let _ = self.shared.events.send(event);
    }
}

fn facet<'a, T, F>(facet: Facet, wrap: fn(T) -> FacetValue, request: F) -> BoxFuture<'a, Outcome>
where
    T: Send + 'a,
    F: Future<Output = Result<T, SourceError>> + Send + 'a,
{
    async move { Outcome::Facet(facet, request.await.map(wrap)) }.boxed()
}
