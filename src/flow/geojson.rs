use crate::flow::{
    error::Error,
    structs::{records_from_results, TrafficRecord},
};

use serde_json::{json, Value};
use std::{fs::File, io::Write, path::Path};

pub fn convert_to_geojson(features: &[Value]) -> Value {
    let output = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    return output;
}

// Build one LineString feature per record, in input order
pub fn get_record_features(records: &[TrafficRecord]) -> Vec<Value> {
    let features = records
        .iter()
        .map(|record| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": get_record_coords(record),
                },
                "properties": {
                    "description": &record.description,
                    "speed": record.speed,
                    "jamFactor": record.jam_factor,
                }
            })
        })
        .collect::<Vec<Value>>();

    return features;
}

/// Coordinates as `[longitude, latitude]` pairs.
pub fn get_record_coords(record: &TrafficRecord) -> Vec<[f64; 2]> {
    record.shape.coords().map(|coord| [coord.x, coord.y]).collect()
}

pub fn to_geojson(records: &[TrafficRecord]) -> Value {
    convert_to_geojson(&get_record_features(records))
}

/// Project raw filtered results, failing with `MalformedRecord` if any lacks shape points.
pub fn results_to_geojson(results: &[Value]) -> Result<Value, Error> {
    let records = records_from_results(results)?;
    Ok(to_geojson(&records))
}

/// Write a GeoJSON document as pretty-printed JSON.
pub fn write_geojson<P: AsRef<Path>>(path: P, geojson: &Value) -> Result<(), Error> {
    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(geojson)?.as_bytes())?;
    Ok(())
}
