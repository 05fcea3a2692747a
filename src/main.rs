use clap::Parser;

use traffic_flow::config::FlowSettings;
use traffic_flow::server::server::start_server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    settings: FlowSettings,

    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Origin allowed to call the API from a browser
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    cors_origin: String,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    traffic_flow::init_logging();
    let args = Args::parse();

    start_server(args.settings, &args.host, args.port, &args.cors_origin).await
}
