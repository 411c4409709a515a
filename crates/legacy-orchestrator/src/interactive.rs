//! Interactive-mode confirmation checkpoints (spec §4.12): when
//! `interactive_mode` is set, the caller is asked to confirm after
//! discovery, after page selection, and before each page is processed.
//! Non-interactive runs use [`AutoConfirm`], which always proceeds — the
//! same seam, just wired to a no-op instead of a terminal prompt.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPoint {
    AfterDiscovery,
    AfterSelection,
    BeforePage,
}

#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, point: ConfirmationPoint, summary: &str) -> bool;
}

pub struct AutoConfirm;

#[async_trait]
impl ConfirmationGate for AutoConfirm {
    async fn confirm(&self, _point: ConfirmationPoint, _summary: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auto_confirm_always_proceeds() {
        let gate = AutoConfirm;
        assert!(gate.confirm(ConfirmationPoint::AfterDiscovery, "10 pages").await);
        assert!(gate.confirm(ConfirmationPoint::BeforePage, "/cart").await);
    }
}
