use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

pub mod config;
pub mod coordinate;
pub mod export;
pub mod geocoder;
pub mod map;
pub mod markers;
pub mod midpoint;
pub mod queries;

use crate::{
    config::{prompt_api_key, resolve_api_key, Config, API_KEY_VAR},
    geocoder::{Geocoder, OpenCageGeocoder, OPENCAGE_ENDPOINT},
    map::{LeafletRenderer, MapRenderer},
    markers::{geocode_all, render},
    queries::QuerySource,
};

/// Given a list of location queries, mark the locations on an interactive
/// Leaflet map via the OpenCage geocoder service.
///
/// The API key is taken from OPENCAGE_USER_KEY, then --key, and is otherwise
/// asked for interactively.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// A file with a list of queries, one query per line
    ///
    /// Use "-" to read queries from stdin. If the extension is "csv", the
    /// first column of each record is the query.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// A file where the map will be written as HTML
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Starting zoom level
    #[arg(
        short,
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=18)
    )]
    zoom: u8,

    /// Your OpenCage API key
    ///
    /// Get a key here: https://opencagedata.com/users/sign_up
    #[arg(short, long)]
    key: Option<String>,

    /// Also write the marked locations to this file as GeoJSON
    #[arg(long, value_name = "FILE")]
    geojson: Option<PathBuf>,

    /// Base URL of the OpenCage API
    #[arg(
        long,
        value_name = "URL",
        default_value = OPENCAGE_ENDPOINT,
        hide = true
    )]
    endpoint: String,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let input = QuerySource::from(self.input);
        // stdin is busy with the queries, there is nobody to ask
        let prompt = (!input.is_stdin()).then_some(prompt_api_key);
        let api_key = resolve_api_key(env::var(API_KEY_VAR).ok(), self.key, prompt)?;

        Ok(Config {
            input,
            output: self.output,
            geojson: self.geojson,
            zoom: self.zoom,
            endpoint: self.endpoint,
            api_key,
        })
    }
}

/// Run the command-line interface
pub async fn run() -> Result<()> {
    let config = Cli::parse().into_config()?;
    let geocoder = OpenCageGeocoder::new(&config.endpoint, config.api_key.as_str())?;
    mark_locations(&config, &geocoder, &LeafletRenderer).await
}

/// Geocode the configured queries, draw them and write the outputs.
pub async fn mark_locations<G, R>(config: &Config, geocoder: &G, renderer: &R) -> Result<()>
where
    G: Geocoder + ?Sized,
    R: MapRenderer,
{
    // check that we can write to the output file before spending quota on
    // lookups
    fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.output)
        .with_context(|| format!("Cannot write to output file {}", config.output.display()))?;

    let queries = config.input.read()?;
    info!("Read {} queries", queries.len());

    let results = geocode_all(geocoder, &queries).await?;
    let map = render(renderer, &results, config.zoom)?;
    renderer
        .save(&map, &config.output)
        .with_context(|| format!("Failed to save map to {}", config.output.display()))?;
    info!("Wrote map to {}", config.output.display());

    if let Some(path) = &config.geojson {
        let features = export::feature_collection(&results);
        fs::write(path, features.to_string())
            .with_context(|| format!("Failed to write GeoJSON to {}", path.display()))?;
        info!("Wrote GeoJSON to {}", path.display());
    }

    Ok(())
}
