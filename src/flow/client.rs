use awc::Client;
use log::{debug, warn};
use serde_json::Value;
use url::Url;

use crate::config::BoundingBox;
use crate::flow::{
    error::Error,
    filter::{filter_results_by_description, results},
};

pub const BASE_URL: &str = "https://data.traffic.hereapi.com/v7/flow";

pub const MAX_BODY_SIZE: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_key: String,
}

/// Client for the flow endpoint of the traffic API.
pub struct TrafficClient {
    settings: ClientSettings,
    client: Client,
    body_limit: usize,
}

impl TrafficClient {
    pub fn new(settings: ClientSettings) -> Self {
        TrafficClient {
            settings,
            client: Client::default(),
            body_limit: MAX_BODY_SIZE,
        }
    }

    /// Largest response body read, in bytes. Defaults to [`MAX_BODY_SIZE`].
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Url of a flow request for `bbox`, with shape referencing and the API key.
    pub fn flow_url(&self, bbox: &BoundingBox) -> Result<Url, Error> {
        let area = format!("bbox:{}", bbox);
        let url = Url::parse_with_params(
            &self.settings.base_url,
            &[
                ("locationReferencing", "shape"),
                ("in", area.as_str()),
                ("apiKey", self.settings.api_key.as_str()),
            ],
        )?;
        Ok(url)
    }

    /// Fetch the raw flow response for `bbox`.
    pub async fn get_traffic_flow(&self, bbox: &BoundingBox) -> Result<Value, Error> {
        let url = self.flow_url(bbox)?;
        debug!("Requesting traffic flow for bbox {}", bbox);

        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Traffic API answered {} for bbox {}", status, bbox);
            // an error body over the limit is dropped, the status is kept
            let body = match response.body().limit(self.body_limit).await {
                Ok(body) => String::from_utf8_lossy(&body).into_owned(),
                Err(e) => {
                    warn!("Cannot read error body: {}", e);
                    String::new()
                }
            };
            return Err(Error::Upstream {
                code: status.as_u16(),
                body,
            });
        }

        let body = response.body().limit(self.body_limit).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch the flow for `bbox` and keep the results whose description contains `filter`.
    pub async fn fetch_filtered(
        &self,
        bbox: &BoundingBox,
        filter: &str,
    ) -> Result<Vec<Value>, Error> {
        let response = self.get_traffic_flow(bbox).await?;
        let filtered = filter_results_by_description(results(&response), filter);
        debug!(
            "{} of {} results match '{}'",
            filtered.len(),
            results(&response).len(),
            filter
        );
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn flow_url_carries_query_parameters() {
        let client = TrafficClient::new(ClientSettings {
            base_url: BASE_URL.to_string(),
            api_key: "secret".to_string(),
        });
        let bbox: BoundingBox = "13.4,52.5,13.405,52.505".parse().unwrap();
        let url = client.flow_url(&bbox).unwrap();

        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("data.traffic.hereapi.com"));
        assert_eq!(
            params,
            vec![
                ("locationReferencing".to_string(), "shape".to_string()),
                ("in".to_string(), "bbox:13.4,52.5,13.405,52.505".to_string()),
                ("apiKey".to_string(), "secret".to_string()),
            ]
        );
    }

    #[actix_web::test]
    async fn invalid_base_url_is_an_error() {
        let client = TrafficClient::new(ClientSettings {
            base_url: "not a url".to_string(),
            api_key: "secret".to_string(),
        });
        let bbox: BoundingBox = "0,0,1,1".parse().unwrap();
        assert!(matches!(client.flow_url(&bbox), Err(Error::Url(_))));
    }
}
