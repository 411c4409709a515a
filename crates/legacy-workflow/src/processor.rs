//! The workflow engine is generic over how a single page gets processed —
//! acquiring a browser session, running the two-step analyzer, and writing
//! artifacts are all the orchestrator's (C12) concern to wire together.
//! This keeps C11 a pure scheduler, mirroring the teacher's separation of
//! `JobQueue`/`Worker` from the concrete `JobProcessor` implementations.

use async_trait::async_trait;
use legacy_types::analysis::PageResult;

#[async_trait]
pub trait PageProcessor: Send + Sync {
    async fn process(&self, page_id: &str, url: &str) -> PageResult;
}
