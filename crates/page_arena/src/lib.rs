//! A page-based bump arena (a.k.a. region allocator) for bulk, short-lived
//! allocations that are freed all at once.
//!
//! `page-arena` serves byte regions, strings, and numeric slices out of
//! pre-reserved [`Pool`] memory using a bump pointer, and reclaims them in
//! one step by releasing the [`Handle`] they were allocated through.
//! There is no per-object free: this trades fine-grained reclamation for
//! O(1) allocation and zero GC pressure, which suits workloads built
//! around a well-defined scope (a request, a parse, a transform) where
//! every allocation in that scope dies together.
//!
//! # Quick start
//!
//! ```
//! use page_arena::Pool;
//!
//! let pool = Pool::new(256);
//! let mut handle = pool.handle();
//!
//! let greeting = handle.alloc_str("hello, arena");
//! assert_eq!(greeting.as_str(), "hello, arena");
//!
//! let numbers = handle.alloc_slice(&[1i32, 2, 3, 4]);
//! assert_eq!(numbers.as_slice(), &[1, 2, 3, 4]);
//!
//! handle.release(); // every page this handle touched is now idle again
//! ```
//!
//! # Layout
//!
//! A [`Pool`] owns a growing list of chunks, each a contiguous,
//! anonymously-mapped block of 4096 fixed-size pages plus a bitmap
//! tracking which of those pages are idle. Allocations that exceed the
//! pool's page size get a standalone, heap-owned oversized page, tracked
//! by index rather than by bitmap bit. A [`Handle`] threads every page it
//! has written onto through a singly linked list; releasing the handle
//! walks that list once, handing each page back to its chunk or oversized
//! map.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

mod chunk;
mod handle;
mod oversized;
mod page;
mod pool;
mod stats;
mod views;

pub use handle::Handle;
pub use pool::Pool;
pub use stats::{PageLink, PageWalk, Stats};
pub use views::{Bytes, Slice, Str, Strs};
