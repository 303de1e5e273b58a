//! Clients for the services the recommender consumes: the perfume hub
//! catalog and the AI advisor.

pub mod advisor;
pub mod catalog;
pub mod client;
pub mod memory;

pub use advisor::HttpAdvisor;
pub use catalog::{HttpCatalog, HttpCatalogSink};
pub use client::{build_http_client, HubError};
pub use memory::InMemoryCatalog;
