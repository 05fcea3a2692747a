use clap::Args;
use std::{fmt, str::FromStr};

use crate::flow::{
    client::{ClientSettings, BASE_URL},
    error::Error,
};
use crate::poller::PollRequest;

/// Query region as `(min_lon, min_lat, max_lon, max_lat)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Value parser for clap, which wants a displayable error.
    pub fn parse_arg(s: &str) -> Result<BoundingBox, String> {
        s.parse().map_err(|e: Error| e.to_string())
    }
}

impl FromStr for BoundingBox {
    type Err = Error;

    /// Parses `min_lon,min_lat,max_lon,max_lat`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| Error::Config(format!("bbox '{}': {}", s, e)))?;

        let bbox = match values.as_slice() {
            [min_lon, min_lat, max_lon, max_lat] => BoundingBox {
                min_lon: *min_lon,
                min_lat: *min_lat,
                max_lon: *max_lon,
                max_lat: *max_lat,
            },
            _ => {
                return Err(Error::Config(format!(
                    "bbox '{}' must have 4 comma-separated values, found {}",
                    s,
                    values.len()
                )))
            }
        };

        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::Config(format!("bbox '{}' must be finite", s)));
        }
        if bbox.min_lon > bbox.max_lon || bbox.min_lat > bbox.max_lat {
            return Err(Error::Config(format!(
                "bbox '{}' has a minimum above its maximum",
                s
            )));
        }
        Ok(bbox)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Settings shared by the server and the `ctl` binary.
#[derive(Args, Debug, Clone)]
pub struct FlowSettings {
    /// Traffic API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Bounding box as min_lon,min_lat,max_lon,max_lat
    #[arg(long, env = "BBOX", value_parser = BoundingBox::parse_arg)]
    pub bbox: BoundingBox,

    /// Case-insensitive substring matched against location descriptions
    #[arg(long, env = "FILTER", default_value = "")]
    pub filter: String,

    /// SQLite database the poller writes to
    #[arg(long, env = "DB_PATH", default_value = "traffic_flow.db")]
    pub db_path: String,

    /// Flow endpoint of the traffic API
    #[arg(long, env = "TRAFFIC_API_URL", default_value = BASE_URL)]
    pub base_url: String,
}

impl FlowSettings {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
        }
    }

    /// Request scoped to the configured bbox and filter.
    pub fn poll_request(&self) -> PollRequest {
        PollRequest {
            bbox: self.bbox,
            filter: self.filter.clone(),
        }
    }
}
