//! HTTP API handlers for canvass-dash

pub mod buildinfo;
pub mod dataset;
pub mod extract;
pub mod health;
pub mod precincts;
pub mod sessions;

pub use buildinfo::buildinfo_routes;
pub use dataset::dataset_routes;
pub use health::health_routes;
pub use precincts::precinct_routes;
pub use sessions::session_routes;
