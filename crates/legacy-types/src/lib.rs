//! Shared data model and error taxonomy for the legacy-site discovery and
//! analysis engine. Every other crate in the workspace depends on this one;
//! it depends on nothing else in the workspace.

pub mod analysis;
pub mod error;
pub mod progress;
pub mod snapshot;
pub mod url_types;

pub use analysis::*;
pub use error::*;
pub use progress::*;
pub use snapshot::*;
pub use url_types::*;
