use clap::{Parser, Subcommand};
use log::{error, info};
use std::time::Duration;

use traffic_flow::config::FlowSettings;
use traffic_flow::flow::{
    client::TrafficClient, error::Error, geojson, schema::infer,
};
use traffic_flow::poller::{run_poller, PollSchedule};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    settings: FlowSettings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the filtered results as JSON
    Fetch,
    /// Print the inferred schema of the whole API response
    Schema,
    /// Write the filtered results to a GeoJSON file
    Geojson {
        #[arg(long, default_value = "traffic_flow.geojson")]
        output: String,
    },
    /// Poll the API and store the filtered results until the cutoff elapses
    Poll {
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,

        #[arg(long, default_value_t = 3600)]
        cutoff_secs: u64,
    },
}

async fn run(args: Args) -> Result<(), Error> {
    let settings = args.settings;
    let client = TrafficClient::new(settings.client_settings());

    match args.command {
        Command::Fetch => {
            let filtered = client
                .fetch_filtered(&settings.bbox, &settings.filter)
                .await?;
            println!("{}", serde_json::to_string_pretty(&filtered)?);
        }
        Command::Schema => {
            let raw = client.get_traffic_flow(&settings.bbox).await?;
            println!("{}", serde_json::to_string_pretty(&infer(&raw))?);
        }
        Command::Geojson { output } => {
            let filtered = client
                .fetch_filtered(&settings.bbox, &settings.filter)
                .await?;
            let collection = geojson::results_to_geojson(&filtered)?;
            geojson::write_geojson(&output, &collection)?;
            info!("Wrote {} features to {}", filtered.len(), output);
        }
        Command::Poll {
            interval_secs,
            cutoff_secs,
        } => {
            let schedule = PollSchedule {
                interval: Duration::from_secs(interval_secs),
                cutoff: Duration::from_secs(cutoff_secs),
            };
            let summary = run_poller(
                settings.client_settings(),
                &settings.db_path,
                &settings.poll_request(),
                schedule,
            )
            .await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

#[actix_web::main]
async fn main() {
    traffic_flow::init_logging();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
