//! Core library for the `buddy` weather client.
//!
//! This crate defines:
//! - Configuration handling (units, home location, saved cities, endpoints)
//! - Abstractions over weather, place search and location sources, with
//!   HTTP implementations backed by Open-Meteo, api.weather.gov and Nominatim
//! - The city search adapter and the forecast presentation controller
//! - Display rules and the section layout derived from a weather snapshot
//!
//! It is used by `buddy-cli`, but can also be reused by other front ends.

pub mod config;
pub mod display;
pub mod error;
pub mod facet;
pub mod forecast;
pub mod layout;
pub mod location;
pub mod model;
pub mod provider;
pub mod search;
pub mod snapshot;

pub use config::Config;
pub use error::SourceError;
pub use facet::{Facet, FacetState};
pub use forecast::{FetchCycle, ForecastController, SnapshotEvent};
pub use model::{City, Coordinate, Units};
pub use provider::{LocationSource, PlaceSearch, Sources, WeatherSource, sources_from_config};
pub use search::SearchService;
pub use snapshot::{CycleId, CyclePhase, WeatherSnapshot};
