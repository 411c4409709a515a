//! Analysis orchestrator (C12) and read-only resource exposer (C14). See
//! `spec.md` §4.12-4.14. Composes discovery (C2/C3), the browser pool and
//! navigator (C4/C5), the LLM facade/registry/validator (C6-C8), the
//! two-step analyzer (C9), the artifact store (C10), the workflow engine
//! (C11), and the doc generator (C13) into one entry point.

pub mod cost;
pub mod interactive;
pub mod mode;
pub mod processing;
pub mod resources;
pub mod selection;
pub mod site;

pub use cost::{estimate_cost, CostEstimate};
pub use interactive::{AutoConfirm, ConfirmationGate, ConfirmationPoint};
pub use mode::{AnalysisMode, AnalysisOptions, CostPriority};
pub use processing::{slugify, SitePageProcessor};
pub use resources::{get as get_resource, list as list_resources, Resource, ResourceUri};
pub use selection::select_pages;
pub use site::{analyze_legacy_site, AnalysisResult};
