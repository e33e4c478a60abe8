//! Geocode every query and mark the results on a map.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    coordinate::Coordinate,
    geocoder::{Geocoder, Match},
    map::MapRenderer,
    midpoint::midpoint,
};

/// The matches for one query, in the geocoder's ranking order.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    pub query: String,
    pub matches: Vec<Match>,
}

/// All results of a run, in query order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResults(pub Vec<QueryResult>);

impl QueryResults {
    pub fn iter(&self) -> impl Iterator<Item = &QueryResult> {
        self.0.iter()
    }

    /// Every matched coordinate across all queries.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.iter()
            .flat_map(|result| result.matches.iter().map(|m| m.coordinate))
            .collect()
    }
}

/// Look up each query in turn.
///
/// A query that is already a `lat,lng` pair is placed as is, without asking
/// the geocoder. Its label is the query text rather than a reverse-geocoded
/// address, which saves a lookup per literal. Queries with no matches are
/// reported and contribute nothing.
pub async fn geocode_all<G>(geocoder: &G, queries: &[String]) -> Result<QueryResults>
where
    G: Geocoder + ?Sized,
{
    let mut results = vec![];
    for query in queries {
        let matches = match Coordinate::parse_literal(query) {
            Some(coordinate) => {
                debug!("Using literal coordinates for {query:?}");
                vec![Match {
                    coordinate,
                    formatted: query.trim().to_string(),
                    confidence: None,
                }]
            }
            None => geocoder
                .geocode(query)
                .await
                .with_context(|| format!("Failed to geocode {query:?}"))?,
        };

        if matches.is_empty() {
            warn!("No results for {query:?}");
        } else {
            info!("{} result(s) for {query:?}", matches.len());
        }

        results.push(QueryResult {
            query: query.clone(),
            matches,
        });
    }
    Ok(QueryResults(results))
}

/// Popup content for one marker. `rank` starts at 1.
pub fn marker_label(query: &str, rank: usize, total: usize, location: &Match) -> String {
    format!(
        "<p>Query: {}</p><p>Rank: {rank} (of {total})</p>\
         <p>Formatted: {}</p><p>Coordinates: {}</p>",
        escape_html(query),
        escape_html(&location.formatted),
        location.coordinate,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Create a map centered on the midpoint of all results with a marker for
/// every match.
///
/// Fails if there is nothing to center on.
pub fn render<R: MapRenderer>(
    renderer: &R,
    results: &QueryResults,
    zoom: u8,
) -> Result<R::Document> {
    let center = midpoint(&results.coordinates())
        .context("No locations to put on the map")?;
    debug!("Centering map on {center}");

    let mut map = renderer.new_map(center, zoom);
    for result in results.iter() {
        let total = result.matches.len();
        for (rank, location) in (1..).zip(&result.matches) {
            let label = marker_label(&result.query, rank, total, location);
            renderer.add_marker(&mut map, location.coordinate, &label);
        }
    }
    Ok(map)
}
