use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::{City, Coordinate, Units};

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_ALERTS_URL: &str = "https://api.weather.gov/alerts/active";
pub const DEFAULT_REVERSE_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Where the weather, search and location sources send their requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub forecast: String,
    pub geocoding: String,
    pub alerts: String,
    pub reverse_geocoding: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            forecast: DEFAULT_FORECAST_URL.to_string(),
            geocoding: DEFAULT_GEOCODING_URL.to_string(),
            alerts: DEFAULT_ALERTS_URL.to_string(),
            reverse_geocoding: DEFAULT_REVERSE_GEOCODING_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    /// Nominatim and api.weather.gov reject requests without one.
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("buddy/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Stand-in for the device position on machines without a location service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl HomeLocation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// units = "metric"
///
/// [home]
/// name = "Lisbon"
/// latitude = 38.72
/// longitude = -9.14
///
/// [[saved_cities]]
/// name = "Porto, Portugal"
/// latitude = 41.15
/// longitude = -8.61
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub units: Units,
    pub home: Option<HomeLocation>,
    pub saved_cities: Vec<City>,
    pub endpoints: Endpoints,
    pub http: HttpSettings,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherbuddy", "buddy")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_home(&mut self, name: Option<String>, coordinate: Coordinate) {
        self.home = Some(HomeLocation {
            name,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        });
    }

    /// Adds `city` to the saved list. Returns false if a city with the same
    /// name is already saved.
    pub fn add_city(&mut self, city: City) -> bool {
        if self.find_city(city.name()).is_some() {
            return false;
        }
        self.saved_cities.push(city);
        true
    }

    /// Removes the saved city called `name` (case-insensitive).
    pub fn remove_city(&mut self, name: &str) -> Result<City> {
        let idx = self
            .saved_cities
            .iter()
            .position(|c| c.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                anyhow!(
                    "No saved city named '{name}'.\n\
                     Hint: run `buddy cities list` to see saved cities."
                )
            })?;

        Ok(self.saved_cities.remove(idx))
    }

    pub fn find_city(&self, name: &str) -> Option<&City> {
        self.saved_cities.iter().find(|c| c.name().eq_ignore_ascii_case(name))
    }
}
