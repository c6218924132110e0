//! Byte offset ↔ line/column conversion.
//!
//! Lines are 1-based, columns are 0-based byte offsets within the line.
//! Every position reported by the editor uses this convention.

/// Precomputed line-start table for one source text.
#[derive(Debug, Clone)]
pub struct PositionMap {
    line_starts: Vec<usize>,
    len: usize,
}

impl PositionMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Convert a byte offset to (line, column).
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.len);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[line_idx];
        (line_idx as u32 + 1, col as u32)
    }

    /// Convert (line, column) back to a byte offset. `None` when the line
    /// does not exist; columns past the end of the line clamp to it.
    pub fn offset(&self, line: u32, col: u32) -> Option<usize> {
        if line == 0 {
            return None;
        }
        let start = *self.line_starts.get(line as usize - 1)?;
        let end = self
            .line_starts
            .get(line as usize)
            .copied()
            .unwrap_or(self.len);
        Some((start + col as usize).min(end))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_round_trip() {
        let map = PositionMap::new("ab\ncde\n\nf");
        assert_eq!(map.line_col(0), (1, 0));
        assert_eq!(map.line_col(3), (2, 0));
        assert_eq!(map.line_col(5), (2, 2));
        assert_eq!(map.line_col(7), (3, 0));
        assert_eq!(map.line_col(8), (4, 0));
        assert_eq!(map.offset(2, 2), Some(5));
        assert_eq!(map.offset(9, 0), None);
    }

    #[test]
    fn test_empty_source() {
        let map = PositionMap::new("");
        assert_eq!(map.line_col(0), (1, 0));
        assert_eq!(map.offset(1, 0), Some(0));
    }
}
