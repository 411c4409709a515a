//! In-memory `BrowserEngine` used by tests throughout this crate and by
//! `legacy-analyzer`/`legacy-workflow` integration tests, mirroring the
//! teacher's `riptide-intelligence::mock_provider` shape: a scriptable
//! stand-in for the real external capability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::{
    BrowserEngine, BrowserHandle, InteractionAction, InteractionResult, RawNavigation,
};

#[derive(Debug, Clone)]
pub struct ScriptedPage {
    pub status_code: u16,
    pub html: String,
    pub final_url: Option<String>,
}

#[derive(Default)]
pub struct MockBrowserEngine {
    pub pages: HashMap<String, ScriptedPage>,
    pub crash_on_navigate: bool,
}

impl MockBrowserEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, page: ScriptedPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }
}

#[async_trait]
impl BrowserEngine for MockBrowserEngine {
    async fn new_handle(
        &self,
        _kind: crate::engine::EngineKind,
    ) -> Result<Box<dyn BrowserHandle>, String> {
        Ok(Box::new(MockHandle {
            pages: self.pages.clone(),
            crash: self.crash_on_navigate,
            healthy: Arc::new(AtomicBool::new(true)),
            last_text: String::new(),
        }))
    }
}

struct MockHandle {
    pages: HashMap<String, ScriptedPage>,
    crash: bool,
    healthy: Arc<AtomicBool>,
    last_text: String,
}

#[async_trait]
impl BrowserHandle for MockHandle {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<RawNavigation, String> {
        if self.crash {
            self.healthy.store(false, Ordering::SeqCst);
            return Err("simulated browser crash".to_string());
        }
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| format!("no scripted page for {url}"))?;
        self.last_text = strip_tags(&page.html);
        Ok(RawNavigation {
            final_url: page.final_url.unwrap_or_else(|| url.to_string()),
            status_code: page.status_code,
            html: page.html,
            redirect_hops: 0,
            network: Vec::new(),
            load_time_ms: 10,
        })
    }

    async fn visible_text(&self) -> Result<String, String> {
        Ok(self.last_text.clone())
    }

    async fn meta_tags(&self) -> Result<HashMap<String, String>, String> {
        Ok(HashMap::new())
    }

    async fn dom_node_count(&self) -> Result<usize, String> {
        Ok(self.last_text.split_whitespace().count())
    }

    async fn interact(
        &mut self,
        selector: &str,
        action: InteractionAction,
    ) -> Result<InteractionResult, String> {
        Ok(InteractionResult {
            selector: selector.to_string(),
            action,
            navigated_away: false,
        })
    }

    async fn reload(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
