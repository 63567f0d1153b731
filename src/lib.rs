pub mod authors;
pub mod cli;
pub mod coauthor;
pub mod error;
pub mod ingest;
pub mod model;
pub mod pulls;
pub mod report;
pub mod store;
pub mod timeline;
pub mod util;
