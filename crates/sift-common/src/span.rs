use serde::Serialize;

/// Byte-offset span into a query string. Start is inclusive, end is exclusive.
///
/// Positions are 0-based byte offsets. Line/column pairs are only computed
/// when a diagnostic needs them, via [`LineIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// A zero-length span at `offset`.
    pub fn at(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The span as a `Range<usize>`, widened to at least one byte so that
    /// diagnostic renderers always have something to underline.
    pub fn to_range(self) -> std::ops::Range<usize> {
        let start = self.start as usize;
        let end = (self.end as usize).max(start + 1);
        start..end
    }
}

/// Pre-computed index of line start positions for on-demand line/column lookup.
#[derive(Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line. The first entry is always 0.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build a line index by scanning the source text for newline characters.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 1-based (line, column) pair.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        // partition_point yields the first line starting after `offset`.
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line = (line_idx as u32) + 1;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_len_and_merge() {
        let a = Span::new(5, 10);
        let b = Span::new(8, 15);
        assert_eq!(a.len(), 5);
        assert_eq!(a.merge(b), Span::new(5, 15));
        assert!(Span::at(3).is_empty());
    }

    #[test]
    fn empty_span_widens_to_one_byte_range() {
        assert_eq!(Span::at(4).to_range(), 4..5);
        assert_eq!(Span::new(2, 6).to_range(), 2..6);
    }

    #[test]
    fn line_index_multiple_lines() {
        let idx = LineIndex::new("o =>\n  o.num\n  > 2");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(7), (2, 3));
        assert_eq!(idx.line_col(15), (3, 3));
    }
}
