//! Page header layout shared by fixed pages (living inside a [`crate::chunk::Chunk`])
//! and oversized pages (standalone heap blocks).
//!
//! A page is a header immediately followed by a payload region. The header is
//! fixed at [`HEADER_SIZE`] bytes (three machine words) so that address math in
//! `chunk` and `pool` can compute payload offsets without reading the header
//! itself.

use std::mem::size_of;
use std::ptr::NonNull;

/// Size of the page header, in bytes: index + next pointer + bump offset.
pub const HEADER_SIZE: usize = 3 * size_of::<usize>();

const _HEADER_SIZE_MATCHES_LAYOUT: () = assert!(size_of::<PageHeader>() == HEADER_SIZE);

/// Rounds `n` up to the nearest multiple of the native word size.
#[must_use]
pub const fn aligned(n: usize) -> usize {
    let word = size_of::<usize>();
    (n + word - 1) / word * word
}

/// Header stored at the start of every page.
///
/// `index` is chunk-scoped for fixed pages (`0 <= index`) and a unique
/// negative value for oversized pages. `next` threads pages onto a handle's
/// page list; it is not an ownership edge (ownership stays with the chunk or
/// the oversized-page map).
#[repr(C)]
pub(crate) struct PageHeader {
    pub(crate) index: isize,
    pub(crate) next: Option<NonNull<PageHeader>>,
    pub(crate) bump_offset: usize,
}

impl PageHeader {
    /// Pointer to the payload region, immediately following the header.
    ///
    /// # Safety
    /// `page` must point to a live, initialized `PageHeader` followed by at
    /// least one byte of payload.
    pub(crate) unsafe fn payload_ptr(page: NonNull<PageHeader>) -> *mut u8 {
        unsafe { page.as_ptr().cast::<u8>().add(HEADER_SIZE) }
    }

    /// Copies `bytes` to the current bump offset and advances it by
    /// `aligned(bytes.len())`. Returns the address written to.
    ///
    /// # Safety
    /// `page` must be a live page with at least `aligned(bytes.len())` bytes
    /// of remaining capacity past its current bump offset.
    pub(crate) unsafe fn write(page: NonNull<PageHeader>, bytes: &[u8]) -> *mut u8 {
        unsafe {
            let base = page.as_ptr().cast::<u8>();
            let header = page.as_ptr();
            let dst = base.add((*header).bump_offset);
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
            (*header).bump_offset += aligned(bytes.len());
            dst
        }
    }

    /// The next page in the handle's list, or `None` at the tail.
    ///
    /// # Safety
    /// `page` must be a live page.
    pub(crate) unsafe fn next(page: NonNull<PageHeader>) -> Option<NonNull<PageHeader>> {
        unsafe { (*page.as_ptr()).next }
    }

    /// Display id: `0` for "no page", `index` for oversized pages (already
    /// negative), `index + 1` for fixed pages (so fixed ids start at 1).
    ///
    /// # Safety
    /// `page` must be a live page.
    pub(crate) unsafe fn id(page: Option<NonNull<PageHeader>>) -> isize {
        match page {
            None => 0,
            Some(p) => {
                let index = unsafe { (*p.as_ptr()).index };
                if index < 0 {
                    index
                } else {
                    index + 1
                }
            }
        }
    }

    /// Bytes used within the page, excluding the header.
    ///
    /// # Safety
    /// `page` must be a live page.
    pub(crate) unsafe fn used_bytes(page: NonNull<PageHeader>) -> usize {
        unsafe { (*page.as_ptr()).bump_offset - HEADER_SIZE }
    }
}

#[cfg(test)]
mod tests {
    use super::aligned;

    #[test]
    fn aligned_rounds_up_to_word_size() {
        let word = std::mem::size_of::<usize>();
        assert_eq!(aligned(0), 0);
        assert_eq!(aligned(1) % word, 0);
        assert!(aligned(1) >= 1);
        assert_eq!(aligned(word), word);
        assert_eq!(aligned(word + 1), 2 * word);
    }
}
