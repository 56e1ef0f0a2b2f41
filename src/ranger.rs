//! Byte-range partitioning for parallel downloads
//!
//! A [`RangeStrategy`] turns a content length into contiguous, non-overlapping
//! [`Range`]s covering `[0, content_length)` exactly once. The downloader takes
//! the strategy by injection so chunking can be tuned or stubbed out in tests.

use crate::error::RangeError;
use std::fmt;

/// Half-open byte interval `[lower, upper)` with its `Range:` header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    /// First byte offset (inclusive)
    pub lower: u64,
    /// End byte offset (exclusive)
    pub upper: u64,
    /// Prebuilt `Range` request header value, `bytes=<lower>-<upper-1>`
    pub http_header: String,
}

impl Range {
    /// Build a range covering `[lower, upper)`.
    ///
    /// Callers guarantee `lower < upper`.
    #[must_use]
    pub fn new(lower: u64, upper: u64) -> Self {
        debug_assert!(lower < upper, "empty range [{lower}, {upper})");
        Self {
            lower,
            upper,
            http_header: format!("bytes={}-{}", lower, upper - 1),
        }
    }

    /// Number of bytes in the range
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.upper - self.lower
    }

    /// Whether the range covers no bytes
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.upper == self.lower
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lower, self.upper)
    }
}

/// Policy for splitting a download into ranges
pub trait RangeStrategy: Send + Sync {
    /// Partition `content_length` bytes into ordered, contiguous ranges.
    ///
    /// # Errors
    ///
    /// Returns a [`RangeError`] when the policy cannot partition the length.
    fn build_range(&self, content_length: u64) -> Result<Vec<Range>, RangeError>;
}

/// Splits content into at most `hunks` equal ranges; the last one absorbs the remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranger {
    hunks: u64,
}

impl Ranger {
    /// Create a ranger producing up to `hunks` ranges
    #[must_use]
    pub const fn new(hunks: u64) -> Self {
        Self { hunks }
    }

    /// Configured upper bound on the range count
    #[must_use]
    pub const fn hunks(&self) -> u64 {
        self.hunks
    }
}

impl RangeStrategy for Ranger {
    fn build_range(&self, content_length: u64) -> Result<Vec<Range>, RangeError> {
        if self.hunks == 0 {
            return Err(RangeError::ZeroPartitions);
        }
        if content_length == 0 {
            return Err(RangeError::EmptyContent);
        }

        // Content shorter than the hunk count gets one byte per range.
        let count = self.hunks.min(content_length);
        let hunk_size = content_length / count;

        let ranges = (0..count)
            .map(|i| {
                let lower = i * hunk_size;
                let upper = if i == count - 1 {
                    content_length
                } else {
                    lower + hunk_size
                };
                Range::new(lower, upper)
            })
            .collect();

        Ok(ranges)
    }
}

/// Splits content into ranges of `chunk_size` bytes; the last one may be shorter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizeRanger {
    chunk_size: u64,
}

impl FixedSizeRanger {
    /// Create a ranger producing `chunk_size`-byte ranges
    #[must_use]
    pub const fn new(chunk_size: u64) -> Self {
        Self { chunk_size }
    }
}

impl RangeStrategy for FixedSizeRanger {
    fn build_range(&self, content_length: u64) -> Result<Vec<Range>, RangeError> {
        if self.chunk_size == 0 {
            return Err(RangeError::ZeroChunkSize);
        }
        if content_length == 0 {
            return Err(RangeError::EmptyContent);
        }

        let mut ranges = Vec::new();
        let mut lower = 0;
        while lower < content_length {
            let upper = lower.saturating_add(self.chunk_size).min(content_length);
            ranges.push(Range::new(lower, upper));
            lower = upper;
        }

        Ok(ranges)
    }
}

/// One range spanning the whole body, for servers that answer ranges slowly or not at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleRange;

impl RangeStrategy for SingleRange {
    fn build_range(&self, content_length: u64) -> Result<Vec<Range>, RangeError> {
        if content_length == 0 {
            return Err(RangeError::EmptyContent);
        }
        Ok(vec![Range::new(0, content_length)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(ranges: &[Range], content_length: u64) {
        assert!(!ranges.is_empty());
        assert_eq!(ranges[0].lower, 0);
        assert_eq!(ranges[ranges.len() - 1].upper, content_length);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower, "gap or overlap");
        }
        assert!(ranges.iter().all(|r| !r.is_empty()));
        assert_eq!(ranges.iter().map(Range::len).sum::<u64>(), content_length);
    }

    #[test]
    fn test_ranger_even_split() {
        let ranges = Ranger::new(4).build_range(100).unwrap();
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0].http_header, "bytes=0-24");
        assert_eq!(ranges[3].http_header, "bytes=75-99");
        assert_covers(&ranges, 100);
    }

    #[test]
    fn test_ranger_last_range_absorbs_remainder() {
        let ranges = Ranger::new(3).build_range(10).unwrap();
        assert_eq!(
            ranges,
            vec![Range::new(0, 3), Range::new(3, 6), Range::new(6, 10)]
        );
        assert_eq!(ranges[2].http_header, "bytes=6-9");
    }

    #[test]
    fn test_ranger_content_smaller_than_hunks() {
        let ranges = Ranger::new(10).build_range(3).unwrap();
        assert_eq!(ranges.len(), 3);
        assert_covers(&ranges, 3);
    }

    #[test]
    fn test_ranger_rejects_empty_content() {
        assert_eq!(
            Ranger::new(4).build_range(0),
            Err(RangeError::EmptyContent)
        );
    }

    #[test]
    fn test_ranger_rejects_zero_hunks() {
        assert_eq!(
            Ranger::new(0).build_range(10),
            Err(RangeError::ZeroPartitions)
        );
    }

    #[test]
    fn test_ranger_never_exceeds_hunks() {
        let ranges = Ranger::new(4).build_range(10).unwrap();
        assert_eq!(
            ranges,
            vec![Range::new(0, 2), Range::new(2, 4), Range::new(4, 6), Range::new(6, 10)]
        );
    }

    #[test]
    fn test_ranger_covers_many_lengths() {
        for hunks in 1..=12 {
            for len in 1..=257 {
                let ranges = Ranger::new(hunks).build_range(len).unwrap();
                assert_eq!(ranges.len() as u64, hunks.min(len));
                assert_covers(&ranges, len);
            }
        }
    }

    #[test]
    fn test_fixed_size_ranger() {
        let ranges = FixedSizeRanger::new(4).build_range(10).unwrap();
        assert_eq!(
            ranges,
            vec![Range::new(0, 4), Range::new(4, 8), Range::new(8, 10)]
        );
        assert_eq!(
            FixedSizeRanger::new(0).build_range(10),
            Err(RangeError::ZeroChunkSize)
        );
        for len in 1..=100 {
            assert_covers(&FixedSizeRanger::new(7).build_range(len).unwrap(), len);
        }
    }

    #[test]
    fn test_fixed_size_chunk_larger_than_content() {
        assert_eq!(
            FixedSizeRanger::new(u64::MAX).build_range(10).unwrap(),
            vec![Range::new(0, 10)]
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "empty range")]
    fn test_range_rejects_empty_interval() {
        let _ = Range::new(0, 0);
    }

    #[test]
    fn test_single_range() {
        let ranges = SingleRange.build_range(42).unwrap();
        assert_eq!(ranges, vec![Range::new(0, 42)]);
        assert_eq!(ranges[0].http_header, "bytes=0-41");
        assert_eq!(SingleRange.build_range(0), Err(RangeError::EmptyContent));
    }
}
