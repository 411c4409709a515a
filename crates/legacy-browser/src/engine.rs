//! Headless-browser capability port (C4/C5, spec §1: "the headless browser
//! engine (treated as a navigation/DOM/network capture capability)").
//!
//! Real engine wiring (chromium/firefox/webkit driver processes) is
//! deliberately out of scope per `spec.md` §1; this trait is the seam a
//! concrete driver adapter would implement, mirroring how the teacher
//! workspace isolates `riptide-headless`/`riptide-browser` behind
//! `riptide-types::ports`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Chromium,
    Firefox,
    Webkit,
}

impl Default for EngineKind {
    fn default() -> Self {
        EngineKind::Chromium
    }
}

/// One HTTP exchange observed during a navigation, as captured raw by the
/// engine before `legacy-browser::navigator` classifies it into a
/// `NetworkEvent`.
#[derive(Debug, Clone)]
pub struct RawNetworkExchange {
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    pub req_headers: HashMap<String, String>,
    pub resp_headers: HashMap<String, String>,
    pub req_body: Option<String>,
    pub resp_size: u64,
    pub timing_ms: u64,
}

/// Raw result of a single navigation, before DOM/meta extraction.
#[derive(Debug, Clone)]
pub struct RawNavigation {
    pub final_url: String,
    pub status_code: u16,
    pub html: String,
    pub redirect_hops: u32,
    pub network: Vec<RawNetworkExchange>,
    pub load_time_ms: u64,
}

#[derive(Debug, Clone, Copy)]
pub enum InteractionAction {
    Hover,
    Focus,
    Click,
}

#[derive(Debug, Clone)]
pub struct InteractionResult {
    pub selector: String,
    pub action: InteractionAction,
    pub navigated_away: bool,
}

/// A live handle to one browser tab/context. One handle is held by exactly
/// one worker for the lifetime of a single page's processing (spec §4.4
/// ownership rule).
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<RawNavigation, String>;
    async fn visible_text(&self) -> Result<String, String>;
    async fn meta_tags(&self) -> Result<HashMap<String, String>, String>;
    async fn dom_node_count(&self) -> Result<usize, String>;
    async fn interact(
        &mut self,
        selector: &str,
        action: InteractionAction,
    ) -> Result<InteractionResult, String>;
    async fn reload(&mut self) -> Result<(), String>;
    /// `false` once the underlying driver connection is known dead.
    fn is_healthy(&self) -> bool;
}

/// Factory for browser handles of a given engine kind, implemented by the
/// concrete driver integration (out of scope here).
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn new_handle(&self, kind: EngineKind) -> Result<Box<dyn BrowserHandle>, String>;
}
