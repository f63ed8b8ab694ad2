//! Tracking of the last known page of the active query

/// Remembers the last page number reported by the backend for the query
/// that currently owns the result list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCursor {
    last_page: Option<u32>,
}

impl PageCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_page(&self) -> Option<u32> {
        self.last_page
    }

    /// Record the hint of a fresh response. Responses without a usable hint
    /// (the final page carries no `last` relation) keep what is known.
    pub fn observe(&mut self, last_page: Option<u32>) {
        if last_page.is_some() {
            self.last_page = last_page;
        }
    }

    pub fn clear(&mut self) {
        self.last_page = None;
    }

    /// Key of the page following `page_number`, or `None` when `page_number`
    /// was the last one. Without a known last page pagination never ends.
    pub fn next_key(&self, page_number: u32) -> Option<u32> {
        let next = page_number.checked_add(1)?;
        match self.last_page {
            Some(last) if next > last => None,
            _ => Some(next),
        }
    }
}
