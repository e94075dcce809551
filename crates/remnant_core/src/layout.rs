#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        (self.start..self.end).contains(&offset)
    }
}

/// Ranges of `after` that differ from `before`.
///
/// Bytes are compared position by position. When the lengths differ, the
/// tail past the shorter stream is reported as one final range.
pub fn diff_ranges(before: &[u8], after: &[u8]) -> Vec<ByteRange> {
    let mut ranges: Vec<ByteRange> = Vec::new();
    let mut push = |offset: usize| match ranges.last_mut() {
        Some(last) if last.end == offset => last.end += 1,
        _ => ranges.push(ByteRange {
            start: offset,
            end: offset + 1,
        }),
    };

    let common = before.len().min(after.len());
    for (offset, (a, b)) in before.iter().zip(after).enumerate() {
        if a != b {
            push(offset);
        }
    }
    let longest = before.len().max(after.len());
    if longest > common {
        match ranges.last_mut() {
            Some(last) if last.end == common => last.end = longest,
            _ => ranges.push(ByteRange {
                start: common,
                end: longest,
            }),
        }
    }
    ranges
}

/// Total number of bytes covered by `ranges`.
pub fn changed_len(ranges: &[ByteRange]) -> usize {
    ranges.iter().map(ByteRange::len).sum()
}
