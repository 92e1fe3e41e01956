pub mod config;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod filter;
pub mod parsers;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod results;
pub mod sections;
pub mod server;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::ScraperConfig;
pub use pipeline::Scraper;
pub use results::{ScrapeRequest, ScrapeResponse, ScrapeResult};
