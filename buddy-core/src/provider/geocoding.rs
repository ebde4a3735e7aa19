//! Forward place search (Open-Meteo geocoding) and reverse geocoding
//! (Nominatim / OpenStreetMap). Neither needs an API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{SourceError, truncate_body},
    model::{Coordinate, PlaceCandidate, PlaceQuery, ResultType},
};

use super::PlaceSearch;

const SERVICE: &str = "Open-Meteo geocoding";
const MAX_RESULTS: &str = "10";

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    base_url: String,
}

impl OpenMeteoGeocoder {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Vec<GeoResult>,
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    feature_code: Option<String>,
    admin1: Option<String>,
    country: Option<String>,
}

impl GeoResult {
    /// GeoNames populated places (PPL*) and administrative areas (ADM*).
    fn is_address(&self) -> bool {
        match self.feature_code.as_deref() {
            None => true,
            Some(code) => code.starts_with("PPL") || code.starts_with("ADM"),
        }
    }

    fn matches(&self, result_type: ResultType) -> bool {
        match result_type {
            ResultType::Address => self.is_address(),
            ResultType::PointOfInterest => !self.is_address(),
        }
    }

    /// "Name, Region, Country", skipping empty or repeated parts.
    fn title(&self) -> String {
        let mut parts: Vec<&str> = vec![self.name.as_str()];
        for part in [self.admin1.as_deref(), self.country.as_deref()].into_iter().flatten() {
            if !part.is_empty() && !parts.contains(&part) {
                parts.push(part);
            }
        }
        parts.join(", ")
    }

    fn into_candidate(self) -> PlaceCandidate {
        let coordinate = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        };
        PlaceCandidate { title: self.title(), coordinate }
    }
}

#[async_trait]
impl PlaceSearch for OpenMeteoGeocoder {
    async fn search(&self, query: &PlaceQuery) -> Result<Vec<PlaceCandidate>, SourceError> {
        tracing::debug!(fragment = %query.fragment, "Searching places");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("name", query.fragment.as_str()),
                ("count", MAX_RESULTS),
                ("language", "en"),
                ("format", "json"),
            ])
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

        let parsed: GeoResponse = serde_json::from_str(&body)
            .map_err(|source| SourceError::Parse { service: SERVICE, source })?;

        Ok(parsed
            .results
            .into_iter()
            .filter(|r| r.matches(query.result_type))
            .map(GeoResult::into_candidate)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

/// Human-readable place name for a coordinate (e.g. "Seattle, Washington").
/// Returns `None` on any failure; callers fall back to something else.
pub async fn reverse_geocode(http: &Client, base_url: &str, at: Coordinate) -> Option<String> {
    let latitude = at.latitude.to_string();
    let longitude = at.longitude.to_string();

    let response = match http
        .get(base_url)
        .query(&[
            ("lat", latitude.as_str()),
            ("lon", longitude.as_str()),
            ("format", "json"),
            ("addressdetails", "1"),
            ("zoom", "10"),
        ])
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("Reverse geocode request failed: {}", e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("Reverse geocode returned status {}", response.status());
        return None;
    }

    let body: NominatimResponse = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Reverse geocode parse error: {}", e);
            return None;
        }
    };

    let addr = body.address?;
    let suffix = addr.state.clone().or_else(|| addr.country.clone());

    // Prefer city > town > village > municipality for the primary place name
    let place = addr
        .city
        .or(addr.town)
        .or(addr.village)
        .or(addr.municipality)
        .or(addr.county)
        .or(addr.state)
        .or(addr.country)?;

    let result = match suffix {
        Some(s) if !s.is_empty() && s != place => format!("{place}, {s}"),
        _ => place,
    };

    tracing::info!("Reverse geocoded to: {}", result);
    Some(result)
}
