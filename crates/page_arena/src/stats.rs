//! Read-only snapshots of pool counters and page-walking helpers.

use crate::chunk::PAGES_PER_CHUNK;
use crate::handle::Handle;
use crate::page::PageHeader;
use crate::pool::{Pool, PoolInner};

/// A `(page_id, used_bytes)` pair, as returned by [`Stats::pages_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    /// Display id of the page (see [`crate::page::PageHeader::id`]'s rule).
    pub page_id: isize,
    /// Bytes written into the page's payload, excluding the header.
    pub used_bytes: usize,
}

/// One page visited by [`Stats::walk_pages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWalk {
    /// Display id of this page.
    pub page_id: isize,
    /// Display id of the next page in its handle's list, or `0` at the tail.
    pub next_page_id: isize,
    /// Bytes written into the page's payload, excluding the header.
    pub used_bytes: usize,
}

/// A read-only snapshot view over a [`Pool`]'s counters. Borrows the pool
/// for `'pool` but does not freeze its state; each accessor re-reads the
/// pool at call time rather than capturing a point-in-time copy.
pub struct Stats<'pool> {
    pool: &'pool Pool,
}

impl<'pool> Stats<'pool> {
    pub(crate) fn new(pool: &'pool Pool) -> Self {
        Self { pool }
    }

    /// Cumulative bytes reserved from the host (chunk memory plus oversized
    /// page memory). Never decreases.
    #[must_use]
    pub fn roughly_alloc_bytes(&self) -> usize {
        self.pool.with_inner(PoolInner::roughly_alloc_bytes)
    }

    /// Total pages: fixed plus oversized.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.pool.with_inner(PoolInner::pages)
    }

    /// Fixed-in-use pages plus oversized pages.
    #[must_use]
    pub fn pages_in_use(&self) -> usize {
        self.pool.with_inner(PoolInner::pages_in_use)
    }

    /// Idle fixed pages (summed across all chunks).
    #[must_use]
    pub fn pages_idle(&self) -> usize {
        self.pool.with_inner(PoolInner::pages_idle)
    }

    /// `4096 * number of chunks`.
    #[must_use]
    pub fn pages_fixed_sized(&self) -> usize {
        self.pool.with_inner(PoolInner::pages_fixed_sized)
    }

    /// Number of live oversized pages.
    #[must_use]
    pub fn pages_oversized(&self) -> usize {
        self.pool.with_inner(PoolInner::pages_oversized)
    }

    /// The list of `(page_id, used_bytes)` pairs walked from `handle`'s
    /// head, in insertion order.
    #[must_use]
    pub fn pages_link(&self, handle: &Handle<'_>) -> Vec<PageLink> {
        let mut out = Vec::new();
        let mut cursor = handle.head();
        while let Some(page) = cursor {
            // SAFETY: every page reachable from a live handle's head is live.
            let (page_id, used_bytes, next) = unsafe {
                (
                    PageHeader::id(Some(page)),
                    PageHeader::used_bytes(page),
                    PageHeader::next(page),
                )
            };
            out.push(PageLink {
                page_id,
                used_bytes,
            });
            cursor = next;
        }
        out
    }

    /// Visits every in-use page across the pool: oversized pages first
    /// (iteration order over the oversized map is otherwise unspecified),
    /// then fixed pages in ascending chunk/bit order. `visitor` returning
    /// `false` stops the walk early.
    pub fn walk_pages(&self, mut visitor: impl FnMut(PageWalk) -> bool) {
        let continue_walk = self.pool.with_inner(|inner| {
            for header in inner.oversized_headers() {
                // SAFETY: every header in the oversized map is live.
                let (page_id, used_bytes, next) = unsafe {
                    (
                        PageHeader::id(Some(header)),
                        PageHeader::used_bytes(header),
                        PageHeader::next(header),
                    )
                };
                // SAFETY: `next`, if any, is also a live page.
                let next_page_id = unsafe { PageHeader::id(next) };
                if !visitor(PageWalk {
                    page_id,
                    next_page_id,
                    used_bytes,
                }) {
                    return false;
                }
            }

            for chunk_idx in 0..inner.chunk_count() {
                let chunk = inner.chunk(chunk_idx);
                for idx_in_chunk in 0..PAGES_PER_CHUNK {
                    if chunk.is_idle(idx_in_chunk) {
                        continue;
                    }
                    let page = chunk.page_at(idx_in_chunk);
                    // SAFETY: the page is in use per the bitmap check above.
                    let (page_id, used_bytes, next) = unsafe {
                        (
                            PageHeader::id(Some(page)),
                            PageHeader::used_bytes(page),
                            PageHeader::next(page),
                        )
                    };
                    // SAFETY: `next`, if any, is a live page.
                    let next_page_id = unsafe { PageHeader::id(next) };
                    if !visitor(PageWalk {
                        page_id,
                        next_page_id,
                        used_bytes,
                    }) {
                        return false;
                    }
                }
            }
            true
        });
        let _ = continue_walk;
    }
}
