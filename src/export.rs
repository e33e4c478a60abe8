//! GeoJSON copy of the marked locations.

use geojson::{Feature, FeatureCollection, JsonObject, Value};

use crate::{geocoder::Match, markers::QueryResults};

/// One Point feature per match, in the same order as the map markers.
pub fn feature_collection(results: &QueryResults) -> FeatureCollection {
    let features = results
        .iter()
        .flat_map(|result| {
            let total = result.matches.len();
            (1..)
                .zip(&result.matches)
                .map(move |(rank, location)| match_to_feature(&result.query, rank, total, location))
        })
        .collect();

    FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    }
}

/// Convert a ranked match to a GeoJSON feature. GeoJSON positions are
/// longitude first.
fn match_to_feature(query: &str, rank: usize, total: usize, location: &Match) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("query".into(), query.into());
    properties.insert("rank".into(), rank.into());
    properties.insert("total".into(), total.into());
    properties.insert("formatted".into(), location.formatted.clone().into());
    if let Some(confidence) = location.confidence {
        properties.insert("confidence".into(), confidence.into());
    }
    let coords = vec![location.coordinate.longitude, location.coordinate.latitude];
    Feature {
        geometry: Some(Value::Point(coords).into()),
        properties: Some(properties),
        ..Default::default()
    }
}
