// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pagination helper for Cloudflare list operations.
//!
//! Cloudflare pages list results with `page`/`per_page` query parameters and
//! reports the number of pages in `result_info.total_pages`.

use std::future::Future;

use tracing::debug;

use crate::errors::DnsProviderError;

/// One fetched page of a list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total number of pages reported by the API (0 when unknown)
    pub total_pages: u32,
}

/// Fetch every page, starting at page 1, and concatenate the items.
///
/// Stops after the last reported page, or at the first empty page when the
/// API does not report a page count.
///
/// # Errors
///
/// Returns the first error raised by `fetch_page`; items from earlier pages are
/// discarded so callers never act on a partial listing.
pub async fn list_all_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, DnsProviderError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, DnsProviderError>>,
{
    let mut all_items = Vec::new();
    let mut page = 1u32;

    loop {
        let result = fetch_page(page).await?;
        let item_count = result.items.len();
        all_items.extend(result.items);

        debug!(
            page,
            items_in_page = item_count,
            total_items = all_items.len(),
            "Fetched page from Cloudflare API"
        );

        let more = if result.total_pages == 0 {
            item_count > 0
        } else {
            page < result.total_pages
        };
        if !more {
            break;
        }
        page += 1;
    }

    debug!(
        total_pages = page,
        total_items = all_items.len(),
        "Completed paginated list operation"
    );

    Ok(all_items)
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod pagination_tests;
