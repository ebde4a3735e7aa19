//! Device location and time zone resolution.
//!
//! There is no location service to ask on the machines this runs on, so the
//! "device" position is the configured home location.

use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::Client;

use crate::{
    config::HomeLocation,
    error::SourceError,
    model::{City, Coordinate},
    provider::{LocationSource, geocoding::reverse_geocode, openmeteo::OpenMeteoSource},
};

#[derive(Debug, Clone)]
pub struct DeviceLocation {
    http: Client,
    home: Option<HomeLocation>,
    reverse_geocoding_url: String,
    forecast: OpenMeteoSource,
}

impl DeviceLocation {
    pub fn new(
        http: Client,
        home: Option<HomeLocation>,
        reverse_geocoding_url: String,
        forecast: OpenMeteoSource,
    ) -> Self {
        Self { http, home, reverse_geocoding_url, forecast }
    }

    async fn name_for(&self, home: &HomeLocation) -> String {
        if let Some(name) = &home.name {
            return name.clone();
        }

        let at = home.coordinate();
        match reverse_geocode(&self.http, &self.reverse_geocoding_url, at).await {
            Some(name) => name,
            None => at.to_string(),
        }
    }
}

#[async_trait]
impl LocationSource for DeviceLocation {
    async fn current_city(&self) -> Result<City, SourceError> {
        let home = self.home.as_ref().ok_or(SourceError::LocationUnavailable)?;
        let name = self.name_for(home).await;

        tracing::debug!(%name, "Resolved device location");
        Ok(City::at(name, home.coordinate()))
    }

    async fn timezone(&self, at: Coordinate) -> Result<Tz, SourceError> {
        self.forecast.time_zone(at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::Units, provider::nws::NwsAlerts};
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn device(server: &MockServer, home: Option<HomeLocation>) -> DeviceLocation {
        let http = Client::new();
        let alerts = NwsAlerts::new(http.clone(), format!("{}/alerts/active", server.uri()));
        let forecast = OpenMeteoSource::new(
            http.clone(),
            format!("{}/v1/forecast", server.uri()),
            Units::Metric,
            alerts,
        );
        DeviceLocation::new(http, home, format!("{}/reverse", server.uri()), forecast)
    }

    #[tokio::test]
    async fn unnamed_home_is_reverse_geocoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "address": { "town": "Sintra", "state": "Lisbon", "country": "Portugal" }
            })))
            .mount(&server)
            .await;

        let home = HomeLocation { name: None, latitude: 38.8, longitude: -9.39 };
        let city = device(&server, Some(home)).current_city().await.expect("home set");
        assert_eq!(city.name(), "Sintra, Lisbon");
    }

    #[tokio::test]
    async fn reverse_geocode_failure_falls_back_to_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let home = HomeLocation { name: None, latitude: 38.8, longitude: -9.39 };
        let city = device(&server, Some(home)).current_city().await.expect("home set");
        assert_eq!(city.name(), "38.8000, -9.3900");
    }

    #[tokio::test]
    async fn no_home_is_unavailable() {
        let server = MockServer::start().await;
        let err = device(&server, None).current_city().await.unwrap_err();
        assert!(matches!(err, SourceError::LocationUnavailable));
    }

    #[tokio::test]
    async fn time_zone_comes_from_forecast_service() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timezone": "Europe/Lisbon"
            })))
            .mount(&server)
            .await;

        let tz = device(&server, None).timezone(Coordinate::new(38.72, -9.14)).await;
        assert_eq!(tz.expect("time zone"), chrono_tz::Europe::Lisbon);
    }

    #[tokio::test]
    async fn unknown_time_zone_name_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timezone": "Mars/Olympus_Mons"
            })))
            .mount(&server)
            .await;

        let err = device(&server, None).timezone(Coordinate::new(0.0, 0.0)).await.unwrap_err();
        assert!(matches!(err, SourceError::UnknownTimeZone(name) if name == "Mars/Olympus_Mons"));
    }
}
