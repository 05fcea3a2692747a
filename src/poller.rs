use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::BoundingBox;
use crate::flow::{
    client::{ClientSettings, TrafficClient},
    error::Error,
    structs::FlowResult,
};
use crate::store::FlowStore;

/// What one poll loop fetches. Fixed for the lifetime of the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollRequest {
    pub bbox: BoundingBox,
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSchedule {
    /// Pause after each tick
    pub interval: Duration,
    /// Wall-clock time after which no new tick starts
    pub cutoff: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        PollSchedule {
            interval: Duration::from_secs(5),
            cutoff: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub polls: usize,
    pub failures: usize,
    pub rows_written: usize,
}

/// Run a poll loop on its own thread with its own actix system.
///
/// Loops are independent: calling this twice with the same request starts two
/// loops writing to the same database.
pub fn spawn_poller(
    client: ClientSettings,
    db_path: String,
    request: PollRequest,
    schedule: PollSchedule,
) -> std::io::Result<JoinHandle<PollSummary>> {
    thread::Builder::new()
        .name("traffic-poller".to_string())
        .spawn(move || {
            actix_rt::System::new().block_on(run_poller(client, &db_path, &request, schedule))
        })
}

/// Poll until `schedule.cutoff` has elapsed. Failed ticks are logged and counted.
pub async fn run_poller(
    client: ClientSettings,
    db_path: &str,
    request: &PollRequest,
    schedule: PollSchedule,
) -> PollSummary {
    let mut summary = PollSummary::default();

    let mut store = match FlowStore::open(db_path) {
        Ok(store) => store,
        Err(e) => {
            error!("Cannot open flow store {}: {}", db_path, e);
            summary.failures += 1;
            return summary;
        }
    };
    let client = TrafficClient::new(client);

    info!(
        "Polling bbox {} with filter '{}' every {}s for {}s",
        request.bbox,
        request.filter,
        schedule.interval.as_secs_f64(),
        schedule.cutoff.as_secs_f64()
    );

    let start = Instant::now();
    while start.elapsed() < schedule.cutoff {
        summary.polls += 1;
        match poll_once(&client, &mut store, request).await {
            Ok(written) => {
                summary.rows_written += written;
                info!("Stored {} rows for filter '{}'", written, request.filter);
            }
            Err(e) => {
                summary.failures += 1;
                error!("Poll {} failed: {}", summary.polls, e);
            }
        }
        actix_rt::time::sleep(schedule.interval).await;
    }

    info!(
        "Polling finished after {} polls ({} failed, {} rows)",
        summary.polls, summary.failures, summary.rows_written
    );
    summary
}

/// Fetch, filter and persist once.
pub async fn poll_once(
    client: &TrafficClient,
    store: &mut FlowStore,
    request: &PollRequest,
) -> Result<usize, Error> {
    let filtered = client
        .fetch_filtered(&request.bbox, &request.filter)
        .await?;
    let results = FlowResult::parse_all(&filtered)?;
    store.insert_results(&results, &request.bbox, &request.filter, Utc::now())
}
