//! Configuration for serialization and cloning.

use serde::{Deserialize, Serialize};

use crate::clone::CloneMode;

/// Output options used when objects are rendered for an update.
///
/// # Example
///
/// ```
/// use pdf_incremental::config::SerializerOptions;
///
/// let opts = SerializerOptions::default().with_line_break_threshold(64);
/// assert_eq!(opts.line_break_threshold, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerOptions {
    /// Characters written inside a dictionary or array before a line break
    /// is inserted (readability only)
    pub line_break_threshold: usize,

    /// Input bytes per literal-string chunk; chunks are joined by a
    /// backslash-newline continuation
    pub string_chunk_size: usize,

    /// Maximum number of fractional digits written for a real
    pub max_real_precision: usize,

    /// Maximum nesting depth of arrays and dictionaries
    pub max_depth: usize,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            line_break_threshold: 128,
            string_chunk_size: 128,
            max_real_precision: 10,
            max_depth: 256,
        }
    }
}

impl SerializerOptions {
    /// Set the dictionary/array line-break threshold.
    pub fn with_line_break_threshold(mut self, threshold: usize) -> Self {
        self.line_break_threshold = threshold;
        self
    }

    /// Set the literal-string chunk size.
    pub fn with_string_chunk_size(mut self, size: usize) -> Self {
        self.string_chunk_size = size.max(1);
        self
    }

    /// Set the maximum real precision.
    pub fn with_max_real_precision(mut self, precision: usize) -> Self {
        self.max_real_precision = precision;
        self
    }

    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Options for a cross-factory deep copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloneOptions {
    /// Which structural subtrees are pruned
    pub mode: CloneMode,

    /// Maximum nesting depth of the source graph
    pub max_depth: usize,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self::new(CloneMode::Normal)
    }
}

impl CloneOptions {
    /// Options for the given mode.
    pub fn new(mode: CloneMode) -> Self {
        Self {
            mode,
            max_depth: 256,
        }
    }

    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
