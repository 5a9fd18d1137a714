//! Source position tracking for diagnostics
//!
//! The parser annotates every AST node with the region of source text it was
//! built from; the processor threads these through to error messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Create a dummy position for synthesized nodes and tests
    pub fn dummy() -> Self {
        Self::new(0, 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A region of source text, start position to end position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Create a span covering a single position
    pub fn from_location(location: SourceLocation) -> Self {
        Self {
            end: location.clone(),
            start: location,
        }
    }

    /// Create a dummy span for synthesized nodes and tests
    pub fn dummy() -> Self {
        Self::from_location(SourceLocation::dummy())
    }

    /// Smallest span covering both `self` and `other`
    pub fn merge(&self, other: &SourceSpan) -> SourceSpan {
        let start = if self.start.offset <= other.start.offset {
            self.start.clone()
        } else {
            other.start.clone()
        };
        let end = if self.end.offset >= other.end.offset {
            self.end.clone()
        } else {
            other.end.clone()
        };
        SourceSpan::new(start, end)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_orders_by_offset() {
        let a = SourceSpan::new(SourceLocation::new(1, 1, 0), SourceLocation::new(1, 4, 3));
        let b = SourceSpan::new(SourceLocation::new(2, 1, 10), SourceLocation::new(2, 6, 15));

        let merged = a.merge(&b);
        assert_eq!(merged.start, a.start);
        assert_eq!(merged.end, b.end);

        // Merge is symmetric
        assert_eq!(b.merge(&a), merged);
    }

    #[test]
    fn test_display() {
        let loc = SourceLocation::new(3, 7, 42);
        assert_eq!(loc.to_string(), "3:7");

        let span = SourceSpan::new(SourceLocation::new(3, 7, 42), SourceLocation::new(3, 9, 44));
        assert_eq!(span.to_string(), "3:7-3:9");
        assert_eq!(SourceSpan::from_location(loc).to_string(), "3:7");
    }
}
