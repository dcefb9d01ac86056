//! Scripted in-memory page used by the discovery and fetcher tests

use crate::browser::{BrowserError, ElementHandle, RenderedSession, Renderer};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One clickable element of a [`MockPage`]
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    pub tag: String,
    pub text: String,
    pub class: String,
    pub ancestors: Vec<String>,
    pub attrs: HashMap<String, String>,
    pub hidden: bool,
    /// Link chunks revealed by successive clicks
    pub reveals: VecDeque<Vec<String>>,
    pub native_click_fails: bool,
    pub click_fails: bool,
}

impl MockElement {
    pub fn new(tag: &str, text: &str) -> Self {
        Self {
            tag: tag.to_string(),
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = class.to_string();
        self
    }

    pub fn parent_class(mut self, class: &str) -> Self {
        self.ancestors = vec![class.to_string()];
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn reveals(mut self, links: &[&str]) -> Self {
        self.reveals
            .push_back(links.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn native_click_fails(mut self) -> Self {
        self.native_click_fails = true;
        self
    }

    pub fn broken(mut self) -> Self {
        self.click_fails = true;
        self
    }

    fn matches(&self, selector: &str) -> bool {
        selector.split(',').map(str::trim).any(|part| {
            if let Some(attr) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
                self.attrs.contains_key(attr)
            } else {
                part == self.tag
            }
        })
    }
}

#[derive(Debug, Default)]
pub struct MockPageState {
    pub base_links: Vec<String>,
    pub view: Vec<String>,
    pub elements: Vec<MockElement>,
    pub scroll_batches: VecDeque<Vec<String>>,
    pub height: u64,
    pub html: String,
    pub clicks: Vec<String>,
    pub backs: usize,
    pub closed: bool,
}

/// Shared handle to a scripted page
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub state: Arc<Mutex<MockPageState>>,
}

impl MockPage {
    pub fn new(base_links: &[&str]) -> Self {
        let page = Self::default();
        {
            let mut state = page.state.lock().unwrap();
            state.base_links = base_links.iter().map(|l| l.to_string()).collect();
            state.height = 1000;
            state.html = "<html><head><title>Mock</title></head><body></body></html>".to_string();
        }
        page
    }

    pub fn with_element(self, element: MockElement) -> Self {
        self.state.lock().unwrap().elements.push(element);
        self
    }

    pub fn with_scroll_batch(self, links: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .scroll_batches
            .push_back(links.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_html(self, html: &str) -> Self {
        self.state.lock().unwrap().html = html.to_string();
        self
    }

    pub fn session(&self, url: &str) -> MockSession {
        MockSession {
            url: url.to_string(),
            page: self.clone(),
        }
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

pub struct MockSession {
    url: String,
    page: MockPage,
}

#[async_trait]
impl RenderedSession for MockSession {
    fn url(&self) -> &str {
        &self.url
    }

    async fn current_links(&self) -> Result<Vec<String>, BrowserError> {
        let state = self.page.state.lock().unwrap();
        Ok(state.base_links.iter().chain(state.view.iter()).cloned().collect())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        Ok(self.page.state.lock().unwrap().html.clone())
    }

    async fn find_elements(
        &self,
        selector: &str,
    ) -> Result<Vec<Box<dyn ElementHandle>>, BrowserError> {
        let state = self.page.state.lock().unwrap();
        Ok(state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches(selector))
            .map(|(index, _)| {
                Box::new(MockHandle {
                    index,
                    page: self.page.clone(),
                }) as Box<dyn ElementHandle>
            })
            .collect())
    }

    async fn go_back(&self) -> Result<(), BrowserError> {
        let mut state = self.page.state.lock().unwrap();
        state.view.clear();
        state.backs += 1;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        let mut state = self.page.state.lock().unwrap();
        if let Some(batch) = state.scroll_batches.pop_front() {
            state.view.extend(batch);
            state.height += 1000;
        }
        Ok(())
    }

    async fn document_height(&self) -> Result<u64, BrowserError> {
        Ok(self.page.state.lock().unwrap().height)
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.page.state.lock().unwrap().closed = true;
        Ok(())
    }
}

struct MockHandle {
    index: usize,
    page: MockPage,
}

impl MockHandle {
    fn with<T>(&self, f: impl FnOnce(&mut MockElement) -> T) -> T {
        let mut state = self.page.state.lock().unwrap();
        f(&mut state.elements[self.index])
    }

    fn press(&self) -> Result<(), BrowserError> {
        let mut state = self.page.state.lock().unwrap();
        let element = &mut state.elements[self.index];
        if element.click_fails {
            return Err(BrowserError::Script("element detached".to_string()));
        }
        let label = element.text.clone();
        let revealed = element.reveals.pop_front().unwrap_or_default();
        state.view.extend(revealed);
        state.clicks.push(label);
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for MockHandle {
    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.with(|e| {
            if name == "class" {
                Some(e.class.clone()).filter(|c| !c.is_empty())
            } else {
                e.attrs.get(name).cloned()
            }
        }))
    }

    async fn text(&self) -> Result<String, BrowserError> {
        Ok(self.with(|e| e.text.trim().to_string()))
    }

    async fn is_visible(&self) -> Result<bool, BrowserError> {
        Ok(self.with(|e| !e.hidden))
    }

    async fn ancestor_classes(&self) -> Result<Vec<String>, BrowserError> {
        Ok(self.with(|e| e.ancestors.clone()))
    }

    async fn scroll_into_view(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn click(&self) -> Result<(), BrowserError> {
        if self.with(|e| e.native_click_fails) {
            return Err(BrowserError::Script("element not interactable".to_string()));
        }
        self.press()
    }

    async fn force_click(&self) -> Result<(), BrowserError> {
        self.press()
    }
}

/// Renderer that hands out sessions on one scripted page
pub struct MockRenderer {
    pub page: MockPage,
    pub fail: bool,
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn open(&self, url: &str) -> Result<Box<dyn RenderedSession>, BrowserError> {
        if self.fail {
            return Err(BrowserError::Launch("no browser in tests".to_string()));
        }
        Ok(Box::new(self.page.session(url)))
    }
}
