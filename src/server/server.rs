use crate::config::FlowSettings;
use crate::flow::{
    client::TrafficClient,
    error::Error,
    geojson,
    schema::infer,
    structs::FlowResult,
};
use crate::poller::{spawn_poller, PollRequest, PollSchedule};
use crate::server::cors::cors_middleware;
use crate::server::page::{render_index, ChartData};
use crate::store::FlowStore;

use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use log::{error, info};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Shared, read-only application state. Per-request overrides travel in `FlowQuery`.
pub struct AppState {
    pub settings: FlowSettings,
    pub schedule: PollSchedule,
}

/// Optional per-request overrides of the configured bbox and filter.
#[derive(Debug, Default, Deserialize)]
pub struct FlowQuery {
    pub bbox: Option<String>,
    pub filter: Option<String>,
}

impl FlowQuery {
    pub fn resolve(&self, settings: &FlowSettings) -> Result<PollRequest, Error> {
        let mut request = settings.poll_request();
        if let Some(bbox) = &self.bbox {
            request.bbox = bbox.parse()?;
        }
        if let Some(filter) = &self.filter {
            request.filter = filter.clone();
        }
        Ok(request)
    }
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

fn error_response(err: &Error) -> HttpResponse {
    error!("{}", err);
    match err {
        Error::Upstream { code, body } => HttpResponse::BadGateway().json(json!({
            "error": err,
            "code": code,
            "body": body,
        })),
        Error::MalformedRecord { .. } => {
            HttpResponse::UnprocessableEntity().json(json!({ "error": err }))
        }
        Error::Config(_) => HttpResponse::BadRequest().json(json!({ "error": err })),
        _ => HttpResponse::InternalServerError().json(json!({ "error": err })),
    }
}

async fn fetch_filtered(
    data: &AppState,
    query: &FlowQuery,
) -> Result<(PollRequest, Vec<Value>), Error> {
    let request = query.resolve(&data.settings)?;
    let client = TrafficClient::new(data.settings.client_settings());
    let filtered = client
        .fetch_filtered(&request.bbox, &request.filter)
        .await?;
    Ok((request, filtered))
}

#[get("/")]
async fn home(query: web::Query<FlowQuery>, data: web::Data<AppState>) -> impl Responder {
    info!("Rendering traffic page");

    let page = async {
        let (request, filtered) = fetch_filtered(&data, &query).await?;
        let results = FlowResult::parse_all(&filtered)?;
        render_index(&ChartData::from_results(&results), &request)
    };

    match page.await {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(e) => error_response(&e),
    }
}

#[get("/traffic_data")]
async fn traffic_data(query: web::Query<FlowQuery>, data: web::Data<AppState>) -> impl Responder {
    info!("Fetching filtered traffic data");

    match fetch_filtered(&data, &query).await {
        Ok((_, filtered)) => HttpResponse::Ok().json(filtered),
        Err(e) => error_response(&e),
    }
}

#[get("/traffic_geojson")]
async fn traffic_geojson(
    query: web::Query<FlowQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    info!("Projecting filtered traffic data to GeoJSON");

    match fetch_filtered(&data, &query)
        .await
        .and_then(|(_, filtered)| geojson::results_to_geojson(&filtered))
    {
        Ok(collection) => HttpResponse::Ok()
            .content_type("application/geo+json")
            .json(collection),
        Err(e) => error_response(&e),
    }
}

#[get("/schema")]
async fn schema(query: web::Query<FlowQuery>, data: web::Data<AppState>) -> impl Responder {
    info!("Inferring schema of traffic API response");

    let response = async {
        let request = query.resolve(&data.settings)?;
        TrafficClient::new(data.settings.client_settings())
            .get_traffic_flow(&request.bbox)
            .await
    };

    match response.await {
        Ok(raw) => HttpResponse::Ok().json(infer(&raw)),
        Err(e) => error_response(&e),
    }
}

#[get("/history")]
async fn history(query: web::Query<HistoryQuery>, data: web::Data<AppState>) -> impl Responder {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    info!("Reading {} most recent rows", limit);

    let db_path = data.settings.db_path.clone();
    let rows =
        web::block(move || FlowStore::open(&db_path).and_then(|store| store.recent(limit))).await;

    match rows {
        Ok(Ok(rows)) => HttpResponse::Ok().json(rows),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            error!("History query did not complete: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        }
    }
}

#[post("/polling")]
async fn start_polling(query: web::Query<FlowQuery>, data: web::Data<AppState>) -> impl Responder {
    let request = match query.resolve(&data.settings) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };
    info!(
        "Starting poller for bbox {} with filter '{}'",
        request.bbox, request.filter
    );

    let started = spawn_poller(
        data.settings.client_settings(),
        data.settings.db_path.clone(),
        request.clone(),
        data.schedule,
    );

    match started {
        Ok(_) => HttpResponse::Accepted().json(json!({
            "message": "Polling started",
            "bbox": request.bbox.to_string(),
            "filter": request.filter,
            "interval_secs": data.schedule.interval.as_secs_f64(),
            "cutoff_secs": data.schedule.cutoff.as_secs_f64(),
        })),
        Err(e) => error_response(&Error::IO(e)),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(traffic_data)
        .service(traffic_geojson)
        .service(schema)
        .service(history)
        .service(start_polling);
}

pub async fn start_server(
    settings: FlowSettings,
    host: &str,
    port: u16,
    cors_origin: &str,
) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState {
        settings,
        schedule: PollSchedule::default(),
    });
    let cors_origin = cors_origin.to_string();

    info!("Starting server on {}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&cors_origin))
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
