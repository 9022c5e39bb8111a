//! Test utilities for the listing_harvest test suite
//!
//! [`FakeDriver`] is an in-memory page driver. Pages are keyed by URL and
//! hold flat node lists; a node answers to the exact CSS strings it was
//! registered with, and `parent` links give query scoping.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use listing_harvest::driver::{PageDriver, SessionCookie};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// PNG signature and IHDR tag; below the default asset threshold
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

/// PNG header followed by enough bytes to pass the default asset threshold
pub fn photo_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(2048, 0xAB);
    bytes
}

#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub selectors: Vec<String>,
    pub text: Option<String>,
    pub attrs: HashMap<String, String>,
    pub parent: Option<usize>,
    pub hidden: bool,
    pub disabled: bool,
    /// Clicking (or pressing Enter in) this node navigates here
    pub target: Option<String>,
}

impl FakeNode {
    pub fn new(selectors: &[&str]) -> Self {
        Self {
            selectors: selectors.iter().map(|s| (*s).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn inside(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn navigates_to(mut self, url: &str) -> Self {
        self.target = Some(url.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub nodes: Vec<FakeNode>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its index for use with [`FakeNode::inside`].
    pub fn add(&mut self, node: FakeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn with(mut self, node: FakeNode) -> Self {
        self.add(node);
        self
    }

    /// A listing card with child nodes, each given as (selector, text).
    pub fn card(&mut self, card_selector: &str, children: &[(&str, &str)]) -> usize {
        let text = children.iter().map(|(_, t)| *t).collect::<Vec<_>>().join("\n");
        let card = self.add(FakeNode::new(&[card_selector]).text(&text));
        for (selector, text) in children {
            self.add(FakeNode::new(&[selector]).text(text).inside(card));
        }
        card
    }

    fn is_descendant(&self, node: usize, ancestor: usize) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.nodes.get(index).and_then(|n| n.parent);
        }
        false
    }
}

/// Handle to a node on a particular page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeElement {
    pub page: String,
    pub index: usize,
}

#[derive(Debug, Default)]
struct State {
    pages: HashMap<String, FakePage>,
    current: String,
    visits: Vec<String>,
    fills: Vec<(String, String)>,
    clicks: Vec<String>,
    script_clicks: Vec<String>,
    in_session: HashMap<String, Vec<u8>>,
    renders: HashMap<String, Vec<u8>>,
    cookies: Vec<SessionCookie>,
}

#[derive(Debug, Default)]
pub struct FakeDriver {
    state: Mutex<State>,
}

impl FakeDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        driver.state.lock().current = "about:blank".to_string();
        driver
    }

    pub fn add_page(&self, url: &str, page: FakePage) {
        self.state.lock().pages.insert(url.to_string(), page);
    }

    /// Make `url` the current page without recording a visit.
    pub fn open(&self, url: &str) {
        self.state.lock().current = url.to_string();
    }

    pub fn serve_in_session(&self, url: &str, bytes: Vec<u8>) {
        self.state.lock().in_session.insert(url.to_string(), bytes);
    }

    pub fn serve_render(&self, url: &str, bytes: Vec<u8>) {
        self.state.lock().renders.insert(url.to_string(), bytes);
    }

    pub fn add_cookie(&self, name: &str, value: &str, domain: &str) {
        self.state.lock().cookies.push(SessionCookie {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
        });
    }

    pub fn current(&self) -> String {
        self.state.lock().current.clone()
    }

    pub fn visits(&self) -> Vec<String> {
        self.state.lock().visits.clone()
    }

    /// (first selector of the filled node, value)
    pub fn fills(&self) -> Vec<(String, String)> {
        self.state.lock().fills.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    pub fn script_clicks(&self) -> Vec<String> {
        self.state.lock().script_clicks.clone()
    }

    fn with_node<T>(&self, element: &FakeElement, f: impl FnOnce(&FakeNode) -> T) -> Result<T> {
        let state = self.state.lock();
        if element.page != state.current {
            return Err(anyhow!("stale element from {}", element.page));
        }
        let node = state
            .pages
            .get(&element.page)
            .and_then(|p| p.nodes.get(element.index))
            .ok_or_else(|| anyhow!("no node {}", element.index))?;
        Ok(f(node))
    }

    fn activate(&self, element: &FakeElement, log_script: bool) -> Result<()> {
        let (label, target) = self.with_node(element, |n| {
            (n.selectors.first().cloned().unwrap_or_default(), n.target.clone())
        })?;
        let mut state = self.state.lock();
        if log_script {
            state.script_clicks.push(label);
        } else {
            state.clicks.push(label);
        }
        if let Some(url) = target {
            state.visits.push(url.clone());
            state.current = url;
        }
        Ok(())
    }
}

impl PageDriver for FakeDriver {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.visits.push(url.to_string());
        if !state.pages.contains_key(url) {
            return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED at {url}"));
        }
        state.current = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.current())
    }

    async fn query_all(&self, scope: Option<&FakeElement>, css: &str) -> Result<Vec<FakeElement>> {
        let state = self.state.lock();
        let Some(page) = state.pages.get(&state.current) else {
            return Ok(Vec::new());
        };
        if let Some(scope) = scope
            && scope.page != state.current
        {
            return Err(anyhow!("stale scope element"));
        }
        Ok(page
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.selectors.iter().any(|s| s == css))
            .filter(|(i, _)| scope.is_none_or(|s| page.is_descendant(*i, s.index)))
            .map(|(index, _)| FakeElement {
                page: state.current.clone(),
                index,
            })
            .collect())
    }

    async fn text_of(&self, element: &FakeElement) -> Result<Option<String>> {
        self.with_node(element, |n| n.text.clone())
    }

    async fn attribute_of(&self, element: &FakeElement, name: &str) -> Result<Option<String>> {
        self.with_node(element, |n| n.attrs.get(name).cloned())
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        if self.with_node(element, |n| n.hidden)? {
            return Err(anyhow!("element is not clickable at its center"));
        }
        self.activate(element, false)
    }

    async fn script_click(&self, element: &FakeElement) -> Result<()> {
        self.activate(element, true)
    }

    async fn fill(&self, element: &FakeElement, value: &str) -> Result<()> {
        let label = self.with_node(element, |n| n.selectors.first().cloned().unwrap_or_default())?;
        self.state.lock().fills.push((label, value.to_string()));
        Ok(())
    }

    async fn press_enter(&self, element: &FakeElement) -> Result<()> {
        self.activate(element, false)
    }

    async fn scroll_into_view(&self, element: &FakeElement) -> Result<()> {
        self.with_node(element, |_| ())
    }

    async fn is_visible(&self, element: &FakeElement) -> Result<bool> {
        self.with_node(element, |n| !n.hidden)
    }

    async fn is_disabled(&self, element: &FakeElement) -> Result<bool> {
        self.with_node(element, |n| n.disabled)
    }

    async fn click_first_containing_text(&self, phrase: &str) -> Result<bool> {
        let hit = {
            let state = self.state.lock();
            state.pages.get(&state.current).and_then(|page| {
                page.nodes
                    .iter()
                    .rposition(|n| n.text.as_deref().is_some_and(|t| t.contains(phrase)))
                    .map(|index| FakeElement {
                        page: state.current.clone(),
                        index,
                    })
            })
        };
        match hit {
            Some(element) => {
                self.activate(&element, true)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(TINY_PNG.to_vec())
    }

    async fn content(&self) -> Result<String> {
        let state = self.state.lock();
        let body = state
            .pages
            .get(&state.current)
            .map(|p| {
                p.nodes
                    .iter()
                    .filter_map(|n| n.text.clone())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        Ok(format!("<html><body>{body}</body></html>"))
    }

    async fn fetch_in_session(&self, url: &str) -> Result<Vec<u8>> {
        self.state
            .lock()
            .in_session
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("TypeError: Failed to fetch {url}"))
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        Ok(self.state.lock().cookies.clone())
    }

    async fn capture_in_scratch_page(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>> {
        self.state
            .lock()
            .renders
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("scratch navigation to {url} failed"))
    }
}
