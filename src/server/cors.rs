use actix_cors::Cors;
use actix_web::http::header;

pub fn cors_middleware(origin: &str) -> Cors {
    // Only the dashboard origin may call the API from a browser
    Cors::default()
        .allowed_origin(origin)
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}
