//! Paged search driver (RFC 2696 simple paged results).
//!
//! Drives repeated searches with the paged-results control, threading
//! the server-issued cookie through until it comes back empty. The
//! result is the ordered list of pages; merging them is the caller's
//! concern. Losing the bind mid-pagination fails the whole drive — any
//! retry happens at the connection layer, one level up.

use crate::connection::{Connection, OpContext, Operation};
use crate::entry::Entry;
use crate::error::Result;
use crate::transport::{LdapTransport, PageControl, SearchRequest};

/// One page of a paged search.
#[derive(Debug, Clone)]
pub struct Page {
    /// Entries returned in this page.
    pub entries: Vec<Entry>,
    /// The cookie returned with this page; empty on the final page.
    pub cookie: Vec<u8>,
}

impl<L: LdapTransport> Connection<L> {
    /// Executes a search in pages of `page_size` entries.
    ///
    /// The `critical` flag marks the paging control critical, so servers
    /// that do not support paging fail the search instead of silently
    /// returning an unpaged result.
    pub async fn paged_search(
        &mut self,
        request: &SearchRequest,
        page_size: u32,
        critical: bool,
    ) -> Result<Vec<Page>> {
        self.run(PagedSearchOp {
            request: request.clone(),
            page_size,
            critical,
        })
        .await
    }
}

struct PagedSearchOp {
    request: SearchRequest,
    page_size: u32,
    critical: bool,
}

impl<L: LdapTransport> Operation<L> for PagedSearchOp {
    type Output = Vec<Page>;

    async fn execute(&mut self, cx: OpContext<'_, L>) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        let mut cookie: Vec<u8> = Vec::new();

        loop {
            let control = PageControl {
                size: self.page_size,
                cookie: cookie.clone(),
                critical: self.critical,
            };
            let outcome = cx.transport.search(&self.request, Some(&control)).await?;
            cx.check(outcome.response)?;

            cookie = outcome.cookie.unwrap_or_default();
            pages.push(Page {
                entries: outcome.entries,
                cookie: cookie.clone(),
            });

            if cookie.is_empty() {
                break;
            }
            tracing::debug!(pages = pages.len(), "paged search continuing");
        }

        Ok(pages)
    }
}
