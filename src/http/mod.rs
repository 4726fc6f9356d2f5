//! HTTP API: semantic search, the community graph and a small search page

pub mod handler;
pub mod server;

pub use handler::{AppState, QueryRequest};
pub use server::HttpServer;
