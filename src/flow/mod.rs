pub mod client;
pub mod error;
pub mod filter;
pub mod geojson;
pub mod schema;
pub mod structs;
