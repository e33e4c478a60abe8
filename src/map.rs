//! Interactive HTML map output, rendered with Leaflet.

use std::{fs, io, path::Path};

use thiserror::Error;

use crate::coordinate::Coordinate;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to write map: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode marker label: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Builds a map document, places markers on it and writes it out.
pub trait MapRenderer {
    type Document;

    fn new_map(&self, center: Coordinate, zoom: u8) -> Self::Document;

    fn add_marker(&self, map: &mut Self::Document, position: Coordinate, label: &str);

    fn save(&self, map: &Self::Document, path: &Path) -> Result<(), MapError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub position: Coordinate,
    /// Popup content, HTML.
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeafletMap {
    pub center: Coordinate,
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

impl LeafletMap {
    pub fn to_html(&self) -> Result<String, MapError> {
        let mut markers = String::new();
        for marker in &self.markers {
            markers.push_str(&format!(
                "      L.marker([{}, {}]).bindPopup({}).addTo(map);\n",
                marker.position.latitude,
                marker.position.longitude,
                script_string(&marker.label)?,
            ));
        }

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <link rel="stylesheet" href="{LEAFLET_CDN}/leaflet.css" />
    <script src="{LEAFLET_CDN}/leaflet.js"></script>
    <style>
      html, body {{ width: 100%; height: 100%; margin: 0; padding: 0; }}
      #map {{ position: absolute; top: 0; bottom: 0; right: 0; left: 0; }}
    </style>
  </head>
  <body>
    <div id="map"></div>
    <script>
      var map = L.map("map").setView([{lat}, {lng}], {zoom});
      L.tileLayer("https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
        maxZoom: 19,
        detectRetina: true,
        attribution: "&copy; <a href=\"{OSM_COPYRIGHT}\">OpenStreetMap</a> contributors"
      }}).addTo(map);
{markers}    </script>
  </body>
</html>
"#,
            lat = self.center.latitude,
            lng = self.center.longitude,
            zoom = self.zoom,
        ))
    }
}

const LEAFLET_CDN: &str = "https://unpkg.com/leaflet@1.9.4/dist";
const OSM_COPYRIGHT: &str = "https://www.openstreetmap.org/copyright";

/// Encode text as a JavaScript string literal that is safe inside <script>.
fn script_string(text: &str) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(text)?.replace("</", "<\\/"))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LeafletRenderer;

impl MapRenderer for LeafletRenderer {
    type Document = LeafletMap;

    fn new_map(&self, center: Coordinate, zoom: u8) -> LeafletMap {
        LeafletMap {
            center,
            zoom,
            markers: vec![],
        }
    }

    fn add_marker(&self, map: &mut LeafletMap, position: Coordinate, label: &str) {
        map.markers.push(Marker {
            position,
            label: label.to_string(),
        });
    }

    fn save(&self, map: &LeafletMap, path: &Path) -> Result<(), MapError> {
        fs::write(path, map.to_html()?)?;
        Ok(())
    }
}
