pub mod client;
pub mod error;
pub mod types;

pub use client::{Enricher, ScrapeClient};
pub use error::ScrapeError;
pub use types::Enrichment;
