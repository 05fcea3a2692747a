use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::flow::error::Error;

/// One entry of the `results` array returned by the flow endpoint.
/// https://www.here.com/docs/bundle/traffic-api-v7-api-reference/page/index.html#tag/Flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResult {
    pub location: Location,
    pub current_flow: CurrentFlow,
}

/// Road segment a flow result describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub description: String,
    pub length: Option<f64>,
    pub shape: Option<Shape>,
}

/// Shape of a segment, present when `locationReferencing=shape` is requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub points: Vec<ShapePoint>,
    pub length: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapePoint {
    pub lat: f64,
    pub lng: f64,
}

/// Current traffic conditions on a segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentFlow {
    pub speed: f64,
    pub jam_factor: f64,
    pub speed_uncapped: Option<f64>,
    pub free_flow: Option<f64>,
    pub confidence: Option<f64>,
    pub traversability: Option<String>,
}

impl FlowResult {
    /// Decode a raw result entry.
    pub fn from_value(value: &Value) -> Result<FlowResult, Error> {
        FlowResult::deserialize(value).map_err(|e| Error::MalformedRecord {
            description: value
                .pointer("/location/description")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>")
                .to_string(),
            reason: e.to_string(),
        })
    }

    pub fn parse_all(values: &[Value]) -> Result<Vec<FlowResult>, Error> {
        values.iter().map(FlowResult::from_value).collect()
    }
}

/// A traffic record ready for projection, with its shape as a line of
/// `(longitude, latitude)` coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficRecord {
    pub description: String,
    pub shape: LineString<f64>,
    pub speed: f64,
    pub jam_factor: f64,
}

impl TryFrom<&FlowResult> for TrafficRecord {
    type Error = Error;

    /// Only the points of the first link are used.
    fn try_from(result: &FlowResult) -> Result<Self, Self::Error> {
        let points = result
            .location
            .shape
            .as_ref()
            .and_then(|shape| shape.links.first())
            .map(|link| &link.points)
            .filter(|points| !points.is_empty())
            .ok_or_else(|| Error::MalformedRecord {
                description: result.location.description.clone(),
                reason: "missing location.shape.links[0].points".to_string(),
            })?;

        let shape: LineString<f64> = points
            .iter()
            .map(|point| Coord {
                x: point.lng,
                y: point.lat,
            })
            .collect();

        Ok(TrafficRecord {
            description: result.location.description.clone(),
            shape,
            speed: result.current_flow.speed,
            jam_factor: result.current_flow.jam_factor,
        })
    }
}

/// Decode raw results into traffic records, failing on the first malformed one.
pub fn records_from_results(results: &[Value]) -> Result<Vec<TrafficRecord>, Error> {
    FlowResult::parse_all(results)?
        .iter()
        .map(TrafficRecord::try_from)
        .collect()
}
