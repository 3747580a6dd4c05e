//! Sort, filter, and paginate catalog rows for display.
//!
//! The loader's row order depends on the filesystem, so display code always
//! goes through [`select_rows`], which sorts (by `style` then `id` unless
//! another key is asked for).

use crate::models::RuleSummary;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Id,
    Style,
    Category,
    Description,
}

impl SortKey {
    fn compare(self, a: &RuleSummary, b: &RuleSummary) -> Ordering {
        let by_key = match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Style => a.style.cmp(&b.style),
            SortKey::Category => a.category.cmp(&b.category),
            SortKey::Description => a.description.cmp(&b.description),
        };
        by_key.then_with(|| a.style.cmp(&b.style)).then_with(|| a.id.cmp(&b.id))
    }
}

/// Rows whose id, style, category, or description match `filter`, sorted.
pub fn select_rows(rows: &[RuleSummary], filter: Option<&Regex>, sort: SortKey) -> Vec<RuleSummary> {
    let mut out: Vec<RuleSummary> = rows
        .iter()
        .filter(|r| match filter {
            Some(re) => {
                re.is_match(&r.id)
                    || re.is_match(&r.style)
                    || re.is_match(&r.category)
                    || re.is_match(&r.description)
            }
            None => true,
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| sort.compare(a, b));
    out
}

#[derive(Debug, Serialize)]
/// One page of rows. `page` is 1-based.
pub struct Page {
    pub page: usize,
    pub pages: usize,
    pub total: usize,
    pub rows: Vec<RuleSummary>,
}

/// Slice `rows` into pages of `size`; a `size` of 0 means a single page.
pub fn paginate(rows: Vec<RuleSummary>, page: usize, size: usize) -> Page {
    let total = rows.len();
    if size == 0 {
        return Page {
            page: 1,
            pages: 1,
            total,
            rows,
        };
    }
    let pages = total.div_ceil(size).max(1);
    let page = page.clamp(1, pages);
    let rows = rows.into_iter().skip((page - 1) * size).take(size).collect();
    Page {
        page,
        pages,
        total,
        rows,
    }
}
