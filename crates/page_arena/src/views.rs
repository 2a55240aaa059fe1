//! Typed views over raw `(base, len, cap)` regions manufactured by
//! [`crate::handle::Handle`].
//!
//! Rather than one hand-rolled type per element kind, every view is an
//! instance of a single generic slice descriptor plus a `serde::Serialize`
//! impl, so adding a new element type means adding a `Serialize` impl, not a
//! new struct.
//!
//! Every view borrows its handle's pool for `'h` and must not outlive the
//! handle's release.

use std::marker::PhantomData;
use std::ptr::NonNull;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::handle::{Handle, RawRegion};

/// A generic view over a contiguous run of `len` values of type `T`,
/// reinterpreted from a raw byte allocation. `T` must be `Copy`: the view
/// never runs a destructor over the pool's memory, since individual
/// objects within a handle are never freed on their own.
pub struct Slice<'h, T> {
    ptr: Option<NonNull<T>>,
    len: usize,
    cap: usize,
    _marker: PhantomData<&'h ()>,
}

impl<'h, T: Copy> Slice<'h, T> {
    pub(crate) fn from_region(region: RawRegion, len: usize) -> Self {
        Self {
            ptr: region.data.map(NonNull::cast),
            len,
            cap: region.cap / std::mem::size_of::<T>().max(1),
            _marker: PhantomData,
        }
    }

    /// Borrows the underlying elements. Empty for the zero-length
    /// descriptor (`ptr` is `None`).
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self.ptr {
            // SAFETY: the pool's memory for this region is alive for `'h`,
            // word-aligned (every bump advance is word-aligned), and was
            // populated with exactly `len` values of `T` by `Handle::alloc_slice`.
            Some(ptr) => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.len) },
            None => &[],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }
}

/// A raw byte region, before any element-type interpretation.
pub struct Bytes<'h> {
    ptr: Option<NonNull<u8>>,
    len: usize,
    cap: usize,
    _marker: PhantomData<&'h ()>,
}

impl<'h> Bytes<'h> {
    pub(crate) fn from_region(region: RawRegion) -> Self {
        Self {
            ptr: region.data,
            len: region.len,
            cap: region.cap,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match self.ptr {
            // SAFETY: see `Slice::as_slice`.
            Some(ptr) => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.len) },
            None => &[],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }
}

impl Serialize for Bytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.as_slice())
    }
}

/// A UTF-8 string region.
pub struct Str<'h> {
    bytes: Bytes<'h>,
}

impl<'h> Str<'h> {
    pub(crate) fn from_region(region: RawRegion) -> Self {
        Self {
            bytes: Bytes::from_region(region),
        }
    }

    /// Borrows the string.
    ///
    /// # Panics
    /// Panics if the underlying bytes are not valid UTF-8, which cannot
    /// happen through [`Handle::alloc_str`] but could through a caller
    /// constructing one from untrusted byte regions (not exposed publicly).
    #[must_use]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.bytes.as_slice()).expect("page-arena Str region was not valid UTF-8")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Serialize for Str<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One entry in a [`Strs`] array: a `(ptr, len)` descriptor naming a string
/// previously allocated on the same handle. `#[repr(C)]` so the array of
/// descriptors allocated by `Handle::alloc_strs` has a stable, predictable
/// layout to reinterpret.
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct StrDescriptor {
    ptr: Option<NonNull<u8>>,
    len: usize,
}

/// A slice of strings: each string copied individually, followed by a
/// contiguous, separately-allocated array of `(ptr, len)` descriptors.
pub struct Strs<'h> {
    descriptors: Slice<'h, StrDescriptor>,
}

impl<'h> Strs<'h> {
    pub(crate) fn from_parts(handle: &mut Handle<'h>, parts: &[Str<'h>]) -> Self {
        let descriptors: Vec<StrDescriptor> = parts
            .iter()
            .map(|s| StrDescriptor {
                ptr: NonNull::new(s.bytes.as_slice().as_ptr().cast_mut()),
                len: s.len(),
            })
            .collect();
        Self {
            descriptors: handle.alloc_slice(&descriptors),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Borrows the string at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn get(&self, index: usize) -> &str {
        let d = self.descriptors.as_slice()[index];
        match d.ptr {
            // SAFETY: `ptr`/`len` were produced from a live `Str` at
            // construction time and the backing page is still owned by the
            // same handle.
            Some(ptr) => unsafe {
                std::str::from_utf8(std::slice::from_raw_parts(ptr.as_ptr(), d.len))
                    .expect("page-arena Strs entry was not valid UTF-8")
            },
            None => "",
        }
    }
}

impl Serialize for Strs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for i in 0..self.len() {
            seq.serialize_element(self.get(i))?;
        }
        seq.end()
    }
}

macro_rules! numeric_serialize {
    ($($t:ty),*) => {
        $(
            impl Serialize for Slice<'_, $t> {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    let mut seq = serializer.serialize_seq(Some(self.len()))?;
                    for v in self.as_slice() {
                        seq.serialize_element(v)?;
                    }
                    seq.end()
                }
            }
        )*
    };
}

numeric_serialize!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

#[cfg(test)]
mod tests {
    use crate::pool::Pool;

    #[test]
    fn bytes_round_trips_payload() {
        let pool = Pool::new(64);
        let mut h = pool.handle();
        let view = h.alloc_bytes(b"hello");
        assert_eq!(view.as_slice(), b"hello");
    }

    #[test]
    fn str_round_trips_payload() {
        let pool = Pool::new(64);
        let mut h = pool.handle();
        let view = h.alloc_str("hello world");
        assert_eq!(view.as_str(), "hello world");
    }

    #[test]
    fn slice_round_trips_numeric_payload() {
        let pool = Pool::new(64);
        let mut h = pool.handle();
        let view = h.alloc_slice(&[1i32, 2, 3, 4]);
        assert_eq!(view.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn strs_round_trips_each_entry() {
        let pool = Pool::new(64);
        let mut h = pool.handle();
        let view = h.alloc_strs(&["one", "two", "three"]);
        assert_eq!(view.len(), 3);
        assert_eq!(view.get(0), "one");
        assert_eq!(view.get(1), "two");
        assert_eq!(view.get(2), "three");
    }

    #[test]
    fn empty_bytes_region_has_no_data() {
        let pool = Pool::new(64);
        let mut h = pool.handle();
        let view = h.alloc_bytes(&[]);
        assert!(view.is_empty());
        assert_eq!(view.as_slice(), &[] as &[u8]);
    }

    #[test]
    fn serializes_numeric_slice_as_json_array() {
        let pool = Pool::new(64);
        let mut h = pool.handle();
        let view = h.alloc_slice(&[1u32, 2, 3]);
        let json = serde_json::to_string(&view).unwrap();
        assert_eq!(json, "[1,2,3]");
    }
}
