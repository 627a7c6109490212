//! Closed integer intervals and the binary search used for offset and
//! geometry lookups.
//!
//! The search works on anything that can order itself against a key through
//! [`IntervalOrd`], so the same routine maps a character offset to a line
//! and a screen point to a placed word.

use core::cmp::Ordering;

/// Closed interval `[start, end]`. A degenerate interval has `start == end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<T = usize> {
    /// First value contained.
    pub start: T,
    /// Last value contained.
    pub end: T,
}

impl<T: Copy + Ord> Interval<T> {
    /// Build an interval. Endpoints are swapped when given in reverse.
    pub fn new(start: T, end: T) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Single-value interval.
    pub fn point(value: T) -> Self {
        Self {
            start: value,
            end: value,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    /// `start <= x <= end`.
    pub fn contains(&self, x: T) -> bool {
        self.start <= x && x <= self.end
    }

    /// Order of this interval relative to `x`: `Greater` when the interval
    /// starts after `x`, `Less` when it ends before `x`, `Equal` when it
    /// contains `x`.
    pub fn compare_point(&self, x: T) -> Ordering {
        if self.start > x {
            Ordering::Greater
        } else if self.end < x {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }

    /// Order against another interval. A degenerate `other` is treated as
    /// the bare number it holds; otherwise the end points decide.
    pub fn compare_interval(&self, other: &Interval<T>) -> Ordering {
        if other.is_degenerate() {
            self.compare_point(other.start)
        } else {
            self.end.cmp(&other.end)
        }
    }
}

impl Interval<usize> {
    /// Number of values covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Closed intervals always hold at least one value.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Three-way comparison of a searchable element against a key.
///
/// `Less` means the element sorts before the key, `Greater` after it, and
/// `Equal` that the element covers the key.
pub trait IntervalOrd<K: ?Sized> {
    fn interval_cmp(&self, key: &K) -> Ordering;
}

macro_rules! impl_point_ord {
    ($($ty:ty),*) => {
        $(
            impl IntervalOrd<$ty> for Interval<$ty> {
                fn interval_cmp(&self, key: &$ty) -> Ordering {
                    self.compare_point(*key)
                }
            }
        )*
    };
}

impl_point_ord!(usize, isize, u32, i32, u64, i64);

impl<T: Copy + Ord> IntervalOrd<Interval<T>> for Interval<T> {
    fn interval_cmp(&self, key: &Interval<T>) -> Ordering {
        self.compare_interval(key)
    }
}

impl<K: ?Sized, E: IntervalOrd<K>> IntervalOrd<K> for &E {
    fn interval_cmp(&self, key: &K) -> Ordering {
        (**self).interval_cmp(key)
    }
}

/// Binary search over elements sorted and pairwise non-overlapping
/// (touching endpoints allowed).
///
/// Returns `Ok(index)` of the element covering `key`, or `Err(insert)` with
/// the index where `key` would be inserted.
pub fn binary_search<E, K>(items: &[E], key: &K) -> Result<usize, usize>
where
    E: IntervalOrd<K>,
    K: ?Sized,
{
    let mut lo = 0usize;
    let mut hi = items.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match items[mid].interval_cmp(key) {
            Ordering::Equal => return Ok(mid),
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
        }
    }
    Err(lo)
}

/// Collapse a search result into a signed index: the found index, or the
/// bitwise complement of the insertion point (always negative).
pub fn complement_index(result: Result<usize, usize>) -> isize {
    match result {
        Ok(index) => index as isize,
        Err(insert) => !(insert as isize),
    }
}
