mod common;

use buddy_core::{
    CyclePhase, Facet, ForecastController, SnapshotEvent, SourceError, Units,
    display::DisplayFields,
    layout::{self, Section},
    model::WeatherAlert,
};
use chrono_tz::Tz;
use common::{FixedLocation, Script, ScriptedWeather, london, nyc};
use std::{sync::Arc, time::Duration};
use url::Url;

fn controller(weather: Arc<ScriptedWeather>, location: FixedLocation) -> ForecastController {
    ForecastController::new(weather, Arc::new(location), Units::Imperial)
}

fn section_names(sections: &[Section]) -> Vec<&'static str> {
    sections.iter().map(Section::name).collect()
}

#[tokio::test]
async fn new_york_snapshot_derives_display_fields() {
    let weather = Arc::new(ScriptedWeather::with(&nyc(), Script::default()));
    let controller = controller(weather, FixedLocation::new_york());

    let snapshot = controller.fetch_weather(nyc()).await;
    let fields = DisplayFields::derive(&snapshot);

    assert_eq!(snapshot.phase(), CyclePhase::Complete);
    assert!(!snapshot.is_loading());
    assert_eq!(snapshot.time_zone, chrono_tz::America::New_York);
    assert_eq!(fields.high_temperature.as_deref(), Some("65"));
    assert_eq!(fields.low_temperature.as_deref(), Some("58"));

    let sun = fields.sun.expect("two days of sun times");
    assert_eq!(sun.sunrise, "6:42 AM");
    assert_eq!(sun.sunset, "7:05 PM");

    let sections = layout::sections(&snapshot);
    assert!(!sections.iter().any(|s| matches!(s, Section::Alert { .. })));
    assert_eq!(
        section_names(&sections),
        vec![
            "header",
            "current",
            "hourly",
            "daily",
            "sun",
            "humidity",
            "wind",
            "feels_like",
            "uv_index",
            "pressure",
            "attribution",
        ]
    );
}

#[tokio::test]
async fn strong_uv_and_alert_move_to_the_top() {
    let script = Script {
        uv: 7,
        alert: Some(WeatherAlert {
            summary: "Heat Advisory".into(),
            source: Some("NWS New York NY".into()),
            details_url: Url::parse("https://api.weather.gov/alerts/urn:oid:2").ok(),
        }),
        ..Script::default()
    };
    let weather = Arc::new(ScriptedWeather::with(&nyc(), script));
    let controller = controller(weather, FixedLocation::new_york());

    let snapshot = controller.fetch_weather(nyc()).await;
    let names = section_names(&layout::sections(&snapshot));

    assert_eq!(&names[..5], &["header", "current", "alert", "uv_index", "hourly"]);
    assert_eq!(names.iter().filter(|n| **n == "uv_index").count(), 1);
}

#[tokio::test]
async fn one_failed_facet_leaves_the_rest_populated() {
    let script = Script { failing: vec![Facet::Wind], ..Script::default() };
    let weather = Arc::new(ScriptedWeather::with(&nyc(), script));
    let controller = controller(weather, FixedLocation::new_york());

    let snapshot = controller.fetch_weather(nyc()).await;

    assert!(snapshot.failure(Facet::Wind).is_some());
    assert!(snapshot.wind.value().is_none());
    for facet in Facet::all().iter().filter(|f| **f != Facet::Wind) {
        assert!(snapshot.failure(*facet).is_none(), "{facet} should have resolved");
    }
    assert_eq!(snapshot.phase(), CyclePhase::Complete);
    assert!(!section_names(&layout::sections(&snapshot)).contains(&"wind"));
}

#[tokio::test]
async fn late_results_for_a_previous_city_are_ignored() {
    let weather = Arc::new(ScriptedWeather::default());
    weather.script(&nyc(), Script::default());
    weather.script(
        &london(),
        Script { hourly_temperatures: vec![50.0, 55.0, 45.0], humidity: 81, ..Script::default() },
    );
    let release_nyc = weather.gate(&nyc());
    let controller = controller(weather.clone(), FixedLocation::new_york());

    let first = controller.select_city(nyc());
    tokio::task::yield_now().await;
    let second = controller.select_city(london());
    assert!(first.is_cancelled());

    second.settled().await;
    release_nyc.send(true).expect("gate receiver alive");
    first.settled().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let snapshot = controller.snapshot();
    let fields = DisplayFields::derive(&snapshot);
    assert_eq!(snapshot.city().map(|c| c.name()), Some("London"));
    assert_eq!(fields.high_temperature.as_deref(), Some("55"));
    assert_eq!(fields.low_temperature.as_deref(), Some("45"));
    assert_eq!(fields.humidity.as_deref(), Some("81%"));
    assert_eq!(snapshot.phase(), CyclePhase::Complete);
}

#[tokio::test]
async fn cancel_marks_unsettled_facets_failed() {
    let weather = Arc::new(ScriptedWeather::with(&nyc(), Script::default()));
    let release = weather.gate(&nyc());
    let controller = controller(weather, FixedLocation::new_york());

    let cycle = controller.select_city(nyc());
    tokio::task::yield_now().await;
    assert!(controller.is_loading());

    controller.cancel();
    cycle.settled().await;
    release.send(true).expect("gate receiver alive");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_loading());
    for facet in Facet::all() {
        assert_eq!(snapshot.failure(*facet), Some("cancelled"));
    }
    assert_eq!(snapshot.phase(), CyclePhase::Failed("cancelled".into()));
}

#[tokio::test]
async fn every_change_is_published() {
    let weather = Arc::new(ScriptedWeather::with(&nyc(), Script::default()));
    let controller = controller(weather, FixedLocation::new_york());
    let mut events = controller.subscribe();

    controller.fetch_weather(nyc()).await;

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert!(matches!(received.first(), Some(SnapshotEvent::CycleStarted { city, .. }) if city == &nyc()));
    assert!(matches!(
        received.last(),
        Some(SnapshotEvent::CycleFinished { phase: CyclePhase::Complete, .. })
    ));
    let settled = received
        .iter()
        .filter(|e| matches!(e, SnapshotEvent::FacetSettled { ok: true, .. }))
        .count();
    assert_eq!(settled, Facet::all().len());
    assert!(received.iter().any(|e| matches!(
        e,
        SnapshotEvent::TimeZoneResolved { time_zone, .. } if *time_zone == chrono_tz::America::New_York
    )));
}

#[tokio::test]
async fn time_zone_failure_falls_back_to_utc() {
    let weather = Arc::new(ScriptedWeather::with(&nyc(), Script::default()));
    let controller = controller(weather, FixedLocation::default());

    let snapshot = controller.fetch_weather(nyc()).await;
    assert_eq!(snapshot.time_zone, Tz::UTC);
    assert_eq!(snapshot.phase(), CyclePhase::Complete);
}

#[tokio::test]
async fn location_updates_only_fill_an_empty_selection() {
    let weather = Arc::new(ScriptedWeather::default());
    let controller = controller(weather, FixedLocation::new_york());

    let cycle = controller.on_location_update(nyc()).expect("nothing selected yet");
    cycle.settled().await;
    assert!(controller.on_location_update(london()).is_none());
    assert_eq!(controller.selected_city(), Some(nyc()));
}

#[tokio::test]
async fn refresh_from_device_selects_the_device_city() {
    let weather = Arc::new(ScriptedWeather::default());
    let controller = controller(weather.clone(), FixedLocation::new_york());
    controller.fetch_weather(london()).await;

    let cycle = controller.refresh_from_device().await.expect("device city");
    cycle.settled().await;

    assert_eq!(controller.selected_city(), Some(nyc()));
    assert_eq!(controller.phase(), CyclePhase::Complete);
}

#[tokio::test]
async fn refresh_without_device_location_keeps_the_selection() {
    let weather = Arc::new(ScriptedWeather::default());
    let controller = controller(weather, FixedLocation::default());
    controller.fetch_weather(london()).await;

    let err = controller.refresh_from_device().await.unwrap_err();
    assert!(matches!(err, SourceError::LocationUnavailable));
    assert_eq!(controller.selected_city(), Some(london()));
}
