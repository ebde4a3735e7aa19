//! City search adapter over a [`PlaceSearch`] engine.
//!
//! Every query fragment replaces the candidate list wholesale. Results of an
//! older fragment that arrive after a newer one was issued are dropped.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    error::SourceError,
    model::{City, PlaceCandidate, PlaceQuery},
    provider::PlaceSearch,
};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct SearchState {
    latest: u64,
    fragment: String,
    cities: Vec<City>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<SearchState>,
    events: broadcast::Sender<Vec<City>>,
}

#[derive(Debug, Clone)]
pub struct SearchService {
    engine: Arc<dyn PlaceSearch>,
    shared: Arc<Shared>,
}

impl SearchService {
    pub fn new(engine: Arc<dyn PlaceSearch>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine,
            shared: Arc::new(Shared { state: Mutex::new(SearchState::default()), events }),
        }
    }

    /// Starts a search for `fragment` in the background. A blank fragment
    /// clears the list without querying the engine.
    pub fn update(&self, fragment: &str) -> JoinHandle<()> {
        let (ticket, query) = self.issue(fragment);
        let this = self.clone();

        tokio::spawn(async move {
            let results = this.run(&query).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, fragment = %query.fragment, "Place search failed");
                Vec::new()
            });
            this.deliver(ticket, resolvable(results));
        })
    }

    /// Runs one search to completion and returns its cities. If a newer query
    /// was issued meanwhile, the shared list keeps the newer results but the
    /// cities found for `fragment` are still returned.
    pub async fn search(&self, fragment: &str) -> Result<Vec<City>, SourceError> {
        let (ticket, query) = self.issue(fragment);
        let cities = resolvable(self.run(&query).await?);
        self.deliver(ticket, cities.clone());
        Ok(cities)
    }

    /// Replaces the candidate list with the resolvable `results`. Candidates
    /// without a coordinate are dropped. Supersedes searches still in flight.
    pub fn on_results_updated(&self, results: Vec<PlaceCandidate>) -> Vec<City> {
        let cities = resolvable(results);
        let mut state = self.shared.state.lock();
        state.latest += 1;
        self.replace(&mut state, cities.clone());
        cities
    }

    pub fn cities(&self) -> Vec<City> {
        self.shared.state.lock().cities.clone()
    }

    /// The fragment of the most recent query.
    pub fn fragment(&self) -> String {
        self.shared.state.lock().fragment.clone()
    }

    /// Receives every replacement of the candidate list.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<City>> {
        self.shared.events.subscribe()
    }

    fn issue(&self, fragment: &str) -> (u64, PlaceQuery) {
        let query = PlaceQuery::address(fragment.trim());
        let mut state = self.shared.state.lock();
        state.latest += 1;
        state.fragment = query.fragment.clone();
        (state.latest, query)
    }

    async fn run(&self, query: &PlaceQuery) -> Result<Vec<PlaceCandidate>, SourceError> {
        if query.fragment.is_empty() {
            return Ok(Vec::new());
        }
        self.engine.search(query).await
    }

    /// Applies `cities` unless a newer query superseded `ticket`.
    fn deliver(&self, ticket: u64, cities: Vec<City>) {
        let mut state = self.shared.state.lock();
        if state.latest != ticket {
            tracing::debug!(ticket, latest = state.latest, "Dropping superseded search results");
            return;
        }
        self.replace(&mut state, cities);
    }

    fn replace(&self, state: &mut SearchState, cities: Vec<City>) {
        state.cities = cities.clone();
        let _ = self.shared.events.send(cities);
    }
}

fn resolvable(results: Vec<PlaceCandidate>) -> Vec<City> {
    let total = results.len();
    let cities: Vec<City> = results.into_iter().filter_map(PlaceCandidate::into_city).collect();

    tracing::debug!(total, resolved = cities.len(), "Search results updated");
    cities
}
