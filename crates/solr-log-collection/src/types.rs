//! Core types for output collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One captured line of worker output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    pub timestamp: DateTime<Utc>,
    pub worker_id: String,
    /// 1-based position in the merged output stream.
    pub line_number: u64,
    /// Bytes exactly as the worker wrote them, without the line terminator.
    pub raw_line: Vec<u8>,
}

impl OutputEntry {
    pub fn new(worker_id: impl Into<String>, line_number: u64, raw_line: Vec<u8>) -> Self {
        Self {
            timestamp: Utc::now(),
            worker_id: worker_id.into(),
            line_number,
            raw_line,
        }
    }

    /// The line as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw_line).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_lossy() {
        let entry = OutputEntry::new("solr", 1, vec![b'o', b'k', 0xff]);
        assert_eq!(entry.text(), "ok\u{fffd}");
        assert_eq!(entry.raw_line.len(), 3);
    }
}
