use anyhow::{Context, Result, anyhow};
use buddy_core::{
    City, Config, ForecastController, SearchService, Sources, Units, sources_from_config,
};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Select, Text};

use crate::render::Page;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "buddy", version, about = "Weather for the places you care about")]
pub struct Cli {
    /// Units for this run, overriding the configured ones ("metric" or "imperial").
    #[arg(long, global = true, value_parser = parse_units)]
    pub units: Option<Units>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively choose units and a home location.
    Configure,

    /// List places matching a name.
    Search {
        /// Beginning of a place name, e.g. "San".
        fragment: String,
    },

    /// Show weather for a place.
    Show {
        /// Place name or saved city.
        query: String,

        /// Choose among all matches instead of taking the first.
        #[arg(long)]
        pick: bool,
    },

    /// Show weather for the home location.
    Here,

    /// Manage saved cities.
    Cities {
        #[command(subcommand)]
        action: CitiesAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum CitiesAction {
    /// List saved cities.
    List,
    /// Search for a place and save it.
    Add {
        query: String,
        #[arg(long)]
        pick: bool,
    },
    /// Forget a saved city.
    Remove { name: String },
    /// Show weather for a saved city.
    Show { name: String },
}

fn parse_units(value: &str) -> Result<Units, String> {
    Units::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut cfg = Config::load()?;
        if let Some(units) = self.units {
            cfg.units = units;
        }

        match self.command {
            Command::Configure => configure(cfg).await,
            Command::Search { fragment } => {
                let search = SearchService::new(sources(&cfg)?.search);
                let cities = search.search(&fragment).await?;
                if cities.is_empty() {
                    println!("No places match '{fragment}'.");
                }
                for city in cities {
                    println!("{city}  ({})", city.coordinate());
                }
                Ok(())
            }
            Command::Show { query, pick } => {
                let city = match cfg.find_city(&query) {
                    Some(saved) => saved.clone(),
                    None => resolve_city(&cfg, &query, pick).await?,
                };
                show(&cfg, city).await
            }
            Command::Here => {
                let controller = controller(&cfg)?;
                let cycle = controller.refresh_from_device().await?;
                cycle.settled().await;
                println!("{}", Page(&controller.snapshot()));
                Ok(())
            }
            Command::Cities { action } => cities(cfg, action).await,
        }
    }
}

fn sources(cfg: &Config) -> Result<Sources> {
    sources_from_config(cfg).context("Failed to set up weather sources")
}

fn controller(cfg: &Config) -> Result<ForecastController> {
    let sources = sources(cfg)?;
    Ok(ForecastController::new(sources.weather, sources.location, cfg.units))
}

async fn show(cfg: &Config, city: City) -> Result<()> {
    eprintln!("Fetching weather for {city}...");
    let snapshot = controller(cfg)?.fetch_weather(city).await;
    println!("{}", Page(&snapshot));
    Ok(())
}

/// First match for `query`, or a prompt over all matches with `pick`.
async fn resolve_city(cfg: &Config, query: &str, pick: bool) -> Result<City> {
    let search = SearchService::new(sources(cfg)?.search);
    let mut cities = search.search(query).await?;

    if cities.is_empty() {
        return Err(anyhow!(
            "No places match '{query}'.\n\
             Hint: run `buddy search <name>` to see what is available."
        ));
    }

    if pick && cities.len() > 1 {
        return Select::new("Which place?", cities).prompt().context("No place selected");
    }
    Ok(cities.swap_remove(0))
}

async fn cities(mut cfg: Config, action: CitiesAction) -> Result<()> {
    match action {
        CitiesAction::List => {
            if cfg.saved_cities.is_empty() {
                println!("No saved cities. Add one with `buddy cities add <name>`.");
            }
            for city in &cfg.saved_cities {
                println!("{city}  ({})", city.coordinate());
            }
            Ok(())
        }
        CitiesAction::Add { query, pick } => {
            let city = resolve_city(&cfg, &query, pick).await?;
            if !cfg.add_city(city.clone()) {
                println!("{city} is already saved.");
                return Ok(());
            }
            cfg.save()?;
            println!("Saved {city}.");
            Ok(())
        }
        CitiesAction::Remove { name } => {
            let removed = cfg.remove_city(&name)?;
            cfg.save()?;
            println!("Removed {removed}.");
            Ok(())
        }
        CitiesAction::Show { name } => {
            let city = cfg
                .find_city(&name)
                .cloned()
                .ok_or_else(|| anyhow!("No saved city named '{name}'.\nHint: run `buddy cities list`."))?;
            show(&cfg, city).await
        }
    }
}

async fn configure(mut cfg: Config) -> Result<()> {
    let start = Units::all().iter().position(|u| *u == cfg.units).unwrap_or_default();
    cfg.units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read units")?;

    let change_home = match &cfg.home {
        Some(home) => {
            let current = home.name.clone().unwrap_or_else(|| home.coordinate().to_string());
            Confirm::new(&format!("Home is {current}. Change it?"))
                .with_default(false)
                .prompt()
                .context("Failed to read answer")?
        }
        None => true,
    };

    if change_home {
        let query = Text::new("Home location (leave empty to skip):")
            .prompt()
            .context("Failed to read home location")?;

        if !query.trim().is_empty() {
            let city = resolve_city(&cfg, &query, true).await?;
            cfg.set_home(Some(city.name().to_string()), city.coordinate());
        }
    }

    cfg.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
