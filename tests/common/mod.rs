#![allow(dead_code)]

use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use traffic_flow::config::FlowSettings;

/// A stand-in for the traffic API answering every flow request with a fixed response.
pub struct Upstream {
    pub addr: SocketAddr,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl Upstream {
    pub fn url(&self) -> String {
        format!("http://{}/v7/flow", self.addr)
    }

    pub fn settings(&self, filter: &str, db_path: &str) -> FlowSettings {
        FlowSettings {
            api_key: "test-key".to_string(),
            bbox: "-0.8,50.8,-0.6,50.9".parse().unwrap(),
            filter: filter.to_string(),
            db_path: db_path.to_string(),
            base_url: self.url(),
        }
    }

    pub fn requests(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

struct Stub {
    status: StatusCode,
    body: Value,
    queries: Arc<Mutex<Vec<String>>>,
}

async fn flow(req: HttpRequest, stub: web::Data<Stub>) -> HttpResponse {
    stub.queries
        .lock()
        .unwrap()
        .push(req.query_string().to_string());
    HttpResponse::build(stub.status).json(&stub.body)
}

/// Start a stub upstream on an ephemeral port, served from its own thread.
pub fn spawn_upstream(status: u16, body: Value) -> Upstream {
    let queries = Arc::new(Mutex::new(Vec::new()));
    let stub = web::Data::new(Stub {
        status: StatusCode::from_u16(status).unwrap(),
        body,
        queries: queries.clone(),
    });
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        actix_rt::System::new().block_on(async move {
            let server = HttpServer::new(move || {
                App::new()
                    .app_data(stub.clone())
                    .route("/v7/flow", web::get().to(flow))
            })
            .workers(1)
            .disable_signals()
            .bind(("127.0.0.1", 0))
            .unwrap();

            tx.send(server.addrs()[0]).unwrap();
            server.run().await.unwrap();
        });
    });

    Upstream {
        addr: rx.recv().unwrap(),
        queries,
    }
}

fn result(description: &str, points: Value, speed: f64, jam_factor: f64) -> Value {
    json!({
        "location": {
            "description": description,
            "length": 250.0,
            "shape": { "links": [{ "points": points, "length": 250.0 }] }
        },
        "currentFlow": {
            "speed": speed,
            "speedUncapped": speed,
            "freeFlow": 18.0,
            "jamFactor": jam_factor,
            "confidence": 0.9,
            "traversability": "open"
        }
    })
}

/// A flow response with two results matching "tangmere" and one that does not.
pub fn sample_response() -> Value {
    json!({
        "sourceUpdated": "2024-10-01T08:00:00Z",
        "results": [
            result(
                "Tangmere Road",
                json!([{ "lat": 50.85, "lng": -0.71 }, { "lat": 50.86, "lng": -0.72 }]),
                12.5,
                3.2
            ),
            result(
                "A27 Chichester Bypass",
                json!([{ "lat": 50.83, "lng": -0.78 }]),
                25.0,
                0.4
            ),
            result(
                "TANGMERE Airfield",
                json!([{ "lat": 50.84, "lng": -0.70 }]),
                8.0,
                6.1
            ),
        ]
    })
}

/// Like `sample_response` but the matching results have no shape.
pub fn shapeless_response() -> Value {
    json!({
        "results": [
            {
                "location": { "description": "Tangmere Road" },
                "currentFlow": { "speed": 12.5, "jamFactor": 3.2 }
            }
        ]
    })
}
