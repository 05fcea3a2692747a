use askama::Template;
use serde::Serialize;

use crate::flow::{error::Error, structs::FlowResult};
use crate::poller::PollRequest;

/// Series plotted on the index page, one entry per filtered result.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub locations: Vec<String>,
    pub speeds: Vec<f64>,
    pub jam_factors: Vec<f64>,
}

impl ChartData {
    pub fn from_results(results: &[FlowResult]) -> ChartData {
        ChartData {
            locations: results
                .iter()
                .map(|r| r.location.description.clone())
                .collect(),
            speeds: results.iter().map(|r| r.current_flow.speed).collect(),
            jam_factors: results.iter().map(|r| r.current_flow.jam_factor).collect(),
        }
    }
}

/// Index page. Text fields are HTML-escaped, `chart_data` is embedded as is.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    filter: &'a str,
    bbox: String,
    chart_data: String,
}

pub fn render_index(chart: &ChartData, request: &PollRequest) -> Result<String, Error> {
    // `</` would close the script element early
    let chart_data = serde_json::to_string(chart)?.replace("</", "<\\/");

    let page = IndexTemplate {
        filter: &request.filter,
        bbox: request.bbox.to_string(),
        chart_data,
    };
    Ok(page.render()?)
}
