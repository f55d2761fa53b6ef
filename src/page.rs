//! Pagination calculator.

use serde::Serialize;
use std::fmt;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Page descriptor, fully determined by `(item_count, page_index, page_size)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub item_count: u64,
    pub page_size: u64,
    pub page_count: u64,
    pub page_index: u64,
    pub offset: u64,
    pub limit: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Page {
    /// A zero `page_size` is treated as 1 and a zero `page_index` as 1.
    pub fn new(item_count: u64, page_index: u64, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        let page_index = page_index.max(1);
        let page_count = item_count / page_size + u64::from(item_count % page_size > 0);

        if item_count == 0 || page_index > page_count {
            return Page {
                item_count,
                page_size,
                page_count,
                page_index: 1,
                offset: 0,
                limit: 0,
                has_next: false,
                has_previous: false,
            };
        }
        Page {
            item_count,
            page_size,
            page_count,
            page_index,
            offset: page_size * (page_index - 1),
            limit: page_size,
            has_next: page_index < page_count,
            has_previous: page_index > 1,
        }
    }

    /// True when the page selects no rows.
    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "item_count: {}, page_count: {}, page_index: {}, page_size: {}, offset: {}, limit: {}",
            self.item_count, self.page_count, self.page_index, self.page_size, self.offset, self.limit
        )
    }
}

/// Parse a requested page index. Anything non-numeric or below 1 selects page 1.
pub fn get_page_index(s: &str) -> u64 {
    match s.trim().parse::<i64>() {
        Ok(n) if n >= 1 => n as u64,
        _ => 1,
    }
}
