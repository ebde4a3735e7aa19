//! Active weather alerts from the US National Weather Service.
//! Points outside NWS coverage simply have no alert.

use reqwest::{Client, StatusCode, header::ACCEPT};
use serde::Deserialize;
use url::Url;

use crate::{
    error::{SourceError, truncate_body},
    model::{Coordinate, WeatherAlert},
};

const SERVICE: &str = "api.weather.gov";

#[derive(Debug, Clone)]
pub struct NwsAlerts {
    http: Client,
    base_url: String,
}

impl NwsAlerts {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// The most severe alert active at `at`, if any.
    pub async fn active_alert(&self, at: Coordinate) -> Result<Option<WeatherAlert>, SourceError> {
        // NWS rejects points with more than four decimal places.
        let point = format!("{:.4},{:.4}", at.latitude, at.longitude);

        let res = self
            .http
            .get(&self.base_url)
            .header(ACCEPT, "application/geo+json")
            .query(&[("point", point.as_str())])
            .send()
            .await
            .map_err(|source| SourceError::Request { service: SERVICE, source })?;

        let status = res.status();
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
            tracing::debug!(%at, %status, "Point outside alert coverage");
            return Ok(None);
        }

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

        let parsed: NwsResponse = serde_json::from_str(&body)
            .map_err(|source| SourceError::Parse { service: SERVICE, source })?;

        Ok(most_severe(parsed.features))
    }
}

#[derive(Debug, Deserialize)]
struct NwsResponse {
    #[serde(default)]
    features: Vec<NwsFeature>,
}

#[derive(Debug, Deserialize)]
struct NwsFeature {
    id: Option<String>,
    properties: NwsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NwsProperties {
    headline: Option<String>,
    event: Option<String>,
    sender_name: Option<String>,
    severity: Option<String>,
}

fn severity_rank(severity: Option<&str>) -> u8 {
    match severity {
        Some("Extreme") => 4,
        Some("Severe") => 3,
        Some("Moderate") => 2,
        Some("Minor") => 1,
        _ => 0,
    }
}

fn most_severe(features: Vec<NwsFeature>) -> Option<WeatherAlert> {
    let best = features
        .into_iter()
        .filter(|f| f.properties.headline.is_some() || f.properties.event.is_some())
        // Keeps the first of equally severe alerts.
        .reduce(|best, f| {
            if severity_rank(f.properties.severity.as_deref())
                > severity_rank(best.properties.severity.as_deref())
            {
                f
            } else {
                best
            }
        })?;

    let NwsFeature { id, properties } = best;
    let summary = properties.headline.or(properties.event)?;

    Some(WeatherAlert {
        summary,
        source: properties.sender_name,
        details_url: id.as_deref().and_then(|id| Url::parse(id).ok()),
    })
}
