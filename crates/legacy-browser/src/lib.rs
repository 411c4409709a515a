//! Pooled headless-browser session management (C4) and per-page navigation
//! and capture (C5). See `spec.md` §4.4-4.5.

pub mod engine;
pub mod mock_engine;
pub mod navigator;
pub mod pool;

pub use engine::{BrowserEngine, BrowserHandle, EngineKind};
pub use navigator::{navigate_and_extract, NavigateOptions};
pub use pool::{Session, SessionManager, DEFAULT_MAX_CONCURRENT_SESSIONS};
