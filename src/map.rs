//! Station map documents.
//!
//! The dashboard serves a pre-generated map verbatim. `station_geojson`
//! rebuilds an equivalent document from the station table: station markers
//! with popup fields, one polyline per metro line and heat weights.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::error::{DashboardError, Result};
use crate::records::StationRecord;

/// Map centre: Connaught Place, New Delhi.
pub const MAP_CENTRE: (f64, f64) = (28.6139, 77.2090);

pub const LINE_COLOURS: [&str; 6] = ["red", "blue", "green", "orange", "purple", "yellow"];

pub fn read_map_document(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|err| DashboardError::io(path, err))
}

pub fn station_geojson(stations: &[StationRecord]) -> Value {
    let mut features: Vec<Value> = stations
        .iter()
        .map(|station| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    // GeoJSON positions are longitude first.
                    "coordinates": [station.longitude, station.latitude],
                },
                "properties": {
                    "kind": "station",
                    "name": station.name,
                    "daily_ridership": station.daily_ridership,
                    "metro_line": station.metro_line,
                    "opening_year": station.opening_year,
                    "distance_from_first_station_km": station.distance_from_first_km,
                    "heat_weight": station.daily_ridership,
                },
            })
        })
        .collect();

    // Lines keep file order of their stations; colours cycle in sorted line order.
    let mut lines: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for station in stations {
        lines
            .entry(station.metro_line.as_str())
            .or_default()
            .push([station.longitude, station.latitude]);
    }
    features.extend(lines.into_iter().enumerate().map(|(i, (line, coordinates))| {
        json!({
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": coordinates },
            "properties": {
                "kind": "metro_line",
                "name": format!("{} Line", line),
                "colour": LINE_COLOURS[i % LINE_COLOURS.len()],
            },
        })
    }));

    json!({
        "type": "FeatureCollection",
        "properties": {
            "centre": [MAP_CENTRE.1, MAP_CENTRE.0],
            "zoom": 11,
        },
        "features": features,
    })
}

pub fn write_station_geojson(path: impl AsRef<Path>, stations: &[StationRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| DashboardError::io(parent, err))?;
    }
    let document = serde_json::to_string_pretty(&station_geojson(stations))
        .map_err(|err| DashboardError::artifact(path, err))?;
    fs::write(path, document).map_err(|err| DashboardError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(name: &str, line: &str, lat: f64, lon: f64) -> StationRecord {
        StationRecord {
            name: name.into(),
            daily_ridership: 1000,
            metro_line: line.into(),
            opening_year: 2010,
            latitude: lat,
            longitude: lon,
            distance_from_first_km: 1.5,
            station_age: None,
        }
    }

    #[test]
    fn builds_points_then_lines() {
        let stations = vec![
            station("A", "Yellow", 28.7, 77.2),
            station("B", "Blue", 28.6, 77.1),
            station("C", "Yellow", 28.5, 77.3),
        ];
        let doc = station_geojson(&stations);
        let features = doc["features"].as_array().unwrap();
        assert_eq!(features.len(), 5);
        assert_eq!(features[0]["geometry"]["coordinates"], json!([77.2, 28.7]));
        assert_eq!(features[0]["properties"]["name"], "A");

        assert_eq!(features[3]["properties"]["name"], "Blue Line");
        assert_eq!(features[3]["properties"]["colour"], "red");
        assert_eq!(features[4]["properties"]["name"], "Yellow Line");
        assert_eq!(
            features[4]["geometry"]["coordinates"],
            json!([[77.2, 28.7], [77.3, 28.5]])
        );
    }

    #[test]
    fn missing_map_document_names_the_file() {
        let err = read_map_document("/no/map.html").unwrap_err();
        assert!(err.to_string().contains("/no/map.html"));
    }
}
