//! The pool owns every chunk and oversized page and implements the
//! acquire-idle-page and release-page-list algorithms.
//!
//! `Pool` wraps its mutable state in a `RefCell` so a [`crate::handle::Handle`]
//! can hold a plain shared reference to the pool (`&'pool Pool`) rather than
//! a raw address. Rust's borrow checker does the pinning: a `Handle<'pool>`
//! cannot outlive the `Pool` it borrows, so the pool's address is implicitly
//! stable for as long as any handle exists. `RefCell` is `!Sync`, which also
//! rules out sharing one pool across threads without explicit synchronization
//! the caller would have to add themselves; a pool is exclusive to its
//! thread of use.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr::NonNull;

use crate::chunk::{Chunk, PAGES_PER_CHUNK};
use crate::handle::Handle;
use crate::oversized::OversizedPage;
use crate::page::{PageHeader, HEADER_SIZE};

pub(crate) struct PoolInner {
    pub(crate) page_size: usize,
    pub(crate) wrapped_page_size: usize,
    chunks: Vec<Chunk>,
    idle_counts: Vec<u16>,
    oversized: HashMap<isize, OversizedPage>,
    overflow_idx: isize,
    roughly_alloc_bytes: usize,
}

/// Owns all chunks and oversized pages for a single allocation domain.
///
/// A pool lives until dropped; dropping it frees every chunk mapping and
/// every oversized page, regardless of whether handles drawn from it were
/// released first. Forgetting to release a handle before dropping the pool
/// is not a leak: the backing storage for every page it pointed to is
/// reclaimed by the pool's own `Drop`.
pub struct Pool {
    inner: RefCell<PoolInner>,
}

impl Pool {
    /// Creates an empty pool serving fixed pages of `page_size` payload
    /// bytes each (the wrapped page size adds [`crate::page::HEADER_SIZE`]).
    ///
    /// # Panics
    /// Panics if `page_size` is zero.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        assert!(page_size > 0, "page_size must be greater than zero");
        Self {
            inner: RefCell::new(PoolInner {
                page_size,
                wrapped_page_size: page_size + HEADER_SIZE,
                chunks: Vec::new(),
                idle_counts: Vec::new(),
                oversized: HashMap::new(),
                overflow_idx: 0,
                roughly_alloc_bytes: 0,
            }),
        }
    }

    /// Returns a fresh, empty handle drawing from this pool.
    #[must_use]
    pub fn handle(&self) -> Handle<'_> {
        Handle::new(self)
    }

    /// Returns a read-only snapshot view of pool counters.
    #[must_use]
    pub fn stats(&self) -> crate::stats::Stats<'_> {
        crate::stats::Stats::new(self)
    }

    pub(crate) fn page_size(&self) -> usize {
        self.inner.borrow().page_size
    }

    pub(crate) fn wrapped_page_size(&self) -> usize {
        self.inner.borrow().wrapped_page_size
    }

    /// Scans chunks in insertion order for one with an idle page; maps a
    /// new chunk if none has one.
    pub(crate) fn acquire_idle_page(&self) -> NonNull<PageHeader> {
        let mut inner = self.inner.borrow_mut();

        for i in 0..inner.chunks.len() {
            if inner.idle_counts[i] == 0 {
                continue;
            }
            let Some(page) = inner.chunks[i].reserve_next_idle() else {
                tracing::error!(
                    chunk = i,
                    idle_count = inner.idle_counts[i],
                    "idle bitmap reports idle pages but none were found"
                );
                panic!(
                    "BUG: chunk {i} idle count is {} but no idle page found (bitmap corruption)",
                    inner.idle_counts[i]
                );
            };
            inner.idle_counts[i] -= 1;
            return page;
        }

        let chunk_idx = inner.chunks.len();
        let wrapped_page_size = inner.wrapped_page_size;
        let chunk = Chunk::new(chunk_idx, wrapped_page_size);
        let page = chunk
            .reserve_next_idle()
            .expect("a freshly mapped chunk always has an idle page");

        let bytes_charged = wrapped_page_size * PAGES_PER_CHUNK;
        inner.roughly_alloc_bytes += bytes_charged;
        inner.chunks.push(chunk);
        inner.idle_counts.push((PAGES_PER_CHUNK - 1) as u16);

        tracing::debug!(chunk_idx, bytes_charged, "mapped new chunk");
        page
    }

    /// Allocates a standalone oversized page for `payload`, assigns it a
    /// fresh negative index, and registers it in the oversized map.
    pub(crate) fn alloc_oversized(&self, payload: &[u8]) -> NonNull<PageHeader> {
        let mut inner = self.inner.borrow_mut();
        let (owned, header) = OversizedPage::new(payload);

        inner.overflow_idx -= 1;
        let index = inner.overflow_idx;
        // SAFETY: header was just initialized by `OversizedPage::new`.
        let size = unsafe {
            (*header.as_ptr()).index = index;
            (*header.as_ptr()).bump_offset
        };
        inner.roughly_alloc_bytes += size;
        inner.oversized.insert(index, owned);

        tracing::debug!(index, size, "allocated oversized page");
        header
    }

    /// Walks the chain, returning each page to its chunk bitmap or dropping
    /// it from the oversized map.
    pub(crate) fn release_page_list(&self, head: Option<NonNull<PageHeader>>) {
        let mut inner = self.inner.borrow_mut();
        let mut current = head;
        let mut released = 0usize;

        while let Some(page) = current {
            // SAFETY: page is a live page owned by this pool.
            let index = unsafe { (*page.as_ptr()).index };
            let next = unsafe { (*page.as_ptr()).next };
            current = next;

            if index < 0 {
                // Dropping the map entry frees the block; do not touch
                // `page` again after this.
                inner.oversized.remove(&index);
            } else {
                let idx = index as usize;
                let chunk_idx = idx / PAGES_PER_CHUNK;
                let idx_in_chunk = idx % PAGES_PER_CHUNK;
                let flipped = inner.chunks[chunk_idx].release(idx_in_chunk);
                assert!(
                    flipped <= 1,
                    "BUG: chunk release reported flipping more than one bit"
                );
                inner.idle_counts[chunk_idx] += flipped;
                // SAFETY: the chunk still owns this page's backing memory.
                unsafe {
                    (*page.as_ptr()).next = None;
                }
            }
            released += 1;
        }

        tracing::trace!(released, "handle released");
    }

    pub(crate) fn with_inner<R>(&self, f: impl FnOnce(&PoolInner) -> R) -> R {
        f(&self.inner.borrow())
    }
}

impl PoolInner {
    pub(crate) fn roughly_alloc_bytes(&self) -> usize {
        self.roughly_alloc_bytes
    }

    pub(crate) fn pages_fixed_sized(&self) -> usize {
        self.chunks.len() * PAGES_PER_CHUNK
    }

    pub(crate) fn pages_oversized(&self) -> usize {
        self.oversized.len()
    }

    pub(crate) fn pages(&self) -> usize {
        self.pages_fixed_sized() + self.pages_oversized()
    }

    pub(crate) fn pages_idle(&self) -> usize {
        self.idle_counts.iter().map(|&n| n as usize).sum()
    }

    /// Fixed-in-use pages plus oversized pages.
    pub(crate) fn pages_in_use(&self) -> usize {
        (self.pages_fixed_sized() - self.pages_idle()) + self.pages_oversized()
    }

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn chunk(&self, idx: usize) -> &Chunk {
        &self.chunks[idx]
    }

    pub(crate) fn oversized_headers(&self) -> impl Iterator<Item = NonNull<PageHeader>> + '_ {
        self.oversized.values().map(OversizedPage::header)
    }
}
