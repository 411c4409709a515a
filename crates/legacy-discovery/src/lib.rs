//! Robots/sitemap/crawler primitives (C2) composed into a ranked, classified
//! discovery pipeline (C3). See `spec.md` §4.2-4.3.

pub mod crawl;
pub mod fetcher;
pub mod filters;
pub mod pipeline;
pub mod robots;
pub mod sitemap;

pub use crawl::{crawl, CrawlOptions};
pub use fetcher::{FetchedBody, HttpFetcher, ReqwestFetcher};
pub use filters::FilterMode;
pub use pipeline::{discover_website, DiscoveryOptions};
pub use robots::{analyze_robots, RobotsResult};
