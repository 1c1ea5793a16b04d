//! Pagination utilities for service layer
//!
//! Provides a `Pagination` window plus the prev/next links returned by list endpoints.

use serde::Serialize;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u64,
    /// items per page
    pub limit: u64,
}

impl Pagination {
    /// Page 0 becomes 1; limit is clamped to `1..=max_limit`.
    pub fn normalize(self, max_limit: u64) -> Self {
        let page = if self.page == 0 { 1 } else { self.page };
        let limit = self.limit.clamp(1, max_limit.max(1));
        Self { page, limit }
    }

    pub fn skip(&self) -> u64 {
        (self.page.saturating_sub(1)).saturating_mul(self.limit)
    }

    /// Rows before this window, if that count fits an SQL `OFFSET` (signed 64-bit).
    pub fn checked_skip(&self) -> Option<u64> {
        self.page
            .saturating_sub(1)
            .checked_mul(self.limit)
            .filter(|skip| i64::try_from(*skip).is_ok())
    }

    /// `next` iff more rows exist past this window, `prev` iff the window is not the first.
    pub fn links(&self, total: u64) -> PageLinks {
        let skip = self.skip();
        PageLinks {
            next: (skip.saturating_add(self.limit) < total).then(|| PageRef { page: self.page + 1, limit: self.limit }),
            prev: (skip > 0).then(|| PageRef { page: self.page - 1, limit: self.limit }),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, limit: 10 } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: u64,
    pub limit: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}
