//! Continuation state for paginated repository listing.
//!
//! The listing asks for page 1, 2, … and stops at the first short page or at the
//! configured page bound, whichever comes first.

pub const PER_PAGE: usize = 100;

#[derive(Debug, Clone)]
pub struct RepoPager {
    next: Option<u32>,
    max_pages: u32,
    fetched: u32,
    truncated: bool,
}

impl RepoPager {
    pub fn new(max_pages: u32) -> Self {
        Self {
            next: (max_pages > 0).then_some(1),
            max_pages,
            fetched: 0,
            truncated: false,
        }
    }

    /// The page to request next, or `None` once the listing is exhausted.
    pub fn next_page(&self) -> Option<u32> {
        self.next
    }

    /// Records how many entries the last requested page returned.
    pub fn record(&mut self, len: usize) {
        let Some(page) = self.next else {
            return;
        };
        self.fetched += 1;

        self.next = if len < PER_PAGE {
            None
        } else if page >= self.max_pages {
            self.truncated = true;
            None
        } else {
            Some(page + 1)
        };
    }

    pub fn pages_fetched(&self) -> u32 {
        self.fetched
    }

    /// True when the bound stopped the walk while full pages were still coming.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}
