//! Workflow-level state machine and the handle callers use to pause,
//! resume, stop, or skip pages mid-run (spec §4.11).

use std::collections::HashSet;
use std::sync::Arc;

use legacy_types::progress::WorkflowState;
use tokio::sync::{watch, Mutex};

#[derive(Debug, Clone)]
pub struct WorkflowControl {
    state_tx: watch::Sender<WorkflowState>,
    state_rx: watch::Receiver<WorkflowState>,
    skipped: Arc<Mutex<HashSet<String>>>,
}

impl WorkflowControl {
    pub fn new() -> Self {
        let (state_tx, state_rx) = watch::channel(WorkflowState::Idle);
        Self {
            state_tx,
            state_rx,
            skipped: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn state(&self) -> WorkflowState {
        *self.state_rx.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<WorkflowState> {
        self.state_rx.clone()
    }

    fn set_state(&self, state: WorkflowState) {
        let _ = self.state_tx.send(state);
    }

    pub fn start(&self) {
        self.set_state(WorkflowState::Running);
    }

    /// `running -> paused`; in-flight pages finish, no new dequeue.
    pub fn pause(&self) {
        if self.state() == WorkflowState::Running {
            self.set_state(WorkflowState::Paused);
        }
    }

    /// `paused -> running`.
    pub fn resume(&self) {
        if self.state() == WorkflowState::Paused {
            self.set_state(WorkflowState::Running);
        }
    }

    /// `any -> stopped`; in-flight pages are allowed to finalize and
    /// persist partial state.
    pub fn stop(&self) {
        self.set_state(WorkflowState::Stopped);
    }

    pub fn complete(&self) {
        if !matches!(self.state(), WorkflowState::Stopped) {
            self.set_state(WorkflowState::Completed);
        }
    }

    /// Marks a url as skipped; workers check this before dequeuing it.
    pub async fn skip(&self, url: &str) {
        self.skipped.lock().await.insert(url.to_string());
    }

    pub async fn is_skipped(&self, url: &str) -> bool {
        self.skipped.lock().await.contains(url)
    }

    /// Blocks the caller until the workflow leaves the paused state,
    /// returning immediately if it's not paused. Used by workers between
    /// dequeues to honor `pause()`.
    pub async fn wait_while_paused(&self) {
        let mut rx = self.state_rx.clone();
        loop {
            if *rx.borrow() != WorkflowState::Paused {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for WorkflowControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pause_then_resume_round_trips() {
        let control = WorkflowControl::new();
        control.start();
        assert_eq!(control.state(), WorkflowState::Running);
        control.pause();
        assert_eq!(control.state(), WorkflowState::Paused);
        control.resume();
        assert_eq!(control.state(), WorkflowState::Running);
    }

    #[tokio::test]
    async fn stop_overrides_pause() {
        let control = WorkflowControl::new();
        control.start();
        control.pause();
        control.stop();
        assert_eq!(control.state(), WorkflowState::Stopped);
    }

    #[tokio::test]
    async fn skip_marks_url() {
        let control = WorkflowControl::new();
        assert!(!control.is_skipped("https://example.com").await);
        control.skip("https://example.com").await;
        assert!(control.is_skipped("https://example.com").await);
    }
}
