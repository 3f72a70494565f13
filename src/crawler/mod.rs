//! Transaction crawler - monthly spreadsheet downloads from the real-transaction portal

pub mod config;
pub mod error;
pub mod fetch;
pub mod partition;
pub mod plan;
pub mod retry;
pub mod run;
pub mod scan;
pub mod session;
pub mod types;
pub mod utils;

pub use config::{CrawlerConfig, OutputLayout, PortalConfig};
pub use error::CrawlError;
pub use plan::PlanRequest;
pub use run::{CrawlRequest, Crawler};
pub use types::*;
