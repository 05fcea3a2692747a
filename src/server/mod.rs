pub mod cors;
pub mod page;
pub mod server;
