//! List filter state and debounced search
//!
//! List views keep their filters in the URL query string so a reload or a
//! shared link restores the same view. Typing in the search box edits the
//! state immediately but only commits it to the URL once the input has
//! been quiet for the debounce interval.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use url::form_urlencoded;

use voice_console_config::constants::listing;
use voice_console_config::EditorConfig;

/// Filters of a list view
///
/// Also the query shape accepted by the service's list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Free-text search, matched case-insensitively
    pub search: String,
    pub status: Option<String>,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            page: 1,
            page_size: listing::DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterState {
    /// Default filters with the page size a deployment configured
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            page_size: config.page_size.clamp(1, listing::MAX_PAGE_SIZE),
            ..Self::default()
        }
    }

    /// Restore from a URL query string (with or without the leading `?`)
    ///
    /// Unknown keys are ignored; malformed numbers fall back to defaults.
    pub fn from_query_string(query: &str) -> Self {
        Self::from_query_string_with(query, Self::default())
    }

    /// Restore from a query string, taking missing keys from `defaults`
    pub fn from_query_string_with(query: &str, defaults: FilterState) -> Self {
        let mut state = defaults;
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "search" => state.search = value.trim().to_string(),
                "status" if !value.is_empty() => state.status = Some(value.into_owned()),
                "page" => {
                    if let Ok(page) = value.parse::<usize>() {
                        state.page = page.max(1);
                    }
                }
                "page_size" => {
                    if let Ok(size) = value.parse::<usize>() {
                        state.page_size = size.clamp(1, listing::MAX_PAGE_SIZE);
                    }
                }
                _ => {}
            }
        }
        state
    }

    /// Query string for the URL; default values are left out
    pub fn to_query_string(&self) -> String {
        let defaults = Self::default();
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            query.append_pair("search", &self.search);
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("status", status);
        }
        if self.page > 1 {
            query.append_pair("page", &self.page.to_string());
        }
        if self.page_size != defaults.page_size {
            query.append_pair("page_size", &self.page_size.to_string());
        }
        query.finish()
    }

    /// Page size within the allowed bounds
    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, listing::MAX_PAGE_SIZE)
    }

    /// Whether an item passes the filters
    ///
    /// `fields` are the searchable texts of the item.
    pub fn matches(&self, fields: &[&str], status: Option<&str>) -> bool {
        if let Some(wanted) = self.status.as_deref() {
            if !status.is_some_and(|s| s.eq_ignore_ascii_case(wanted)) {
                return false;
            }
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&needle))
    }
}

/// Debounces filter edits before they reach the URL
#[derive(Debug)]
pub struct SearchController {
    state: FilterState,
    committed: FilterState,
    debounce: Duration,
    deadline: Option<Instant>,
}

impl SearchController {
    pub fn new(initial: FilterState, debounce: Duration) -> Self {
        Self {
            committed: initial.clone(),
            state: initial,
            debounce,
            deadline: None,
        }
    }

    /// Controller for a page loaded with `query`
    pub fn from_query_string(query: &str, debounce: Duration) -> Self {
        Self::new(FilterState::from_query_string(query), debounce)
    }

    /// Controller using the configured debounce and page size
    pub fn from_config(query: &str, config: &EditorConfig) -> Self {
        Self::new(
            FilterState::from_query_string_with(query, FilterState::from_config(config)),
            config.search_debounce(),
        )
    }

    /// Live state shown in the inputs
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// State last written to the URL
    pub fn committed(&self) -> &FilterState {
        &self.committed
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Edit the search text; resets to the first page and restarts the timer
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.state.search = text.into();
        self.state.page = 1;
        self.touch();
    }

    /// Status and page changes commit without waiting
    pub fn set_status(&mut self, status: Option<String>) -> Option<String> {
        self.state.status = status;
        self.state.page = 1;
        self.commit()
    }

    pub fn set_page(&mut self, page: usize) -> Option<String> {
        self.state.page = page.max(1);
        self.commit()
    }

    fn touch(&mut self) {
        self.deadline = Some(Instant::now() + self.debounce);
    }

    /// Commit if the debounce interval has passed
    ///
    /// Returns the new query string when the committed state changed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.commit(),
            _ => None,
        }
    }

    /// Wait out a pending debounce, then commit
    pub async fn settle(&mut self) -> Option<String> {
        let deadline = self.deadline?;
        tokio::time::sleep_until(deadline).await;
        self.poll(Instant::now())
    }

    fn commit(&mut self) -> Option<String> {
        self.deadline = None;
        let mut next = self.state.clone();
        next.search = next.search.trim().to_string();
        if next == self.committed {
            return None;
        }
        self.committed = next;
        let query = self.committed.to_query_string();
        tracing::debug!(query = %query, "Committed list filters");
        Some(query)
    }
}
