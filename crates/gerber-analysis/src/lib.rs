pub mod analyzer;
pub mod archive;
pub mod error;
pub mod layers;
pub mod merge;
pub mod parsers;
pub mod types;

pub use analyzer::{analyze, analyze_package, Analyzer, PackageReport};
pub use error::PackageError;
pub use layers::RoleTag;
pub use types::{BoardAnalysisResult, Dimensions, FileAnalysis, RawFile};

/// Default ceiling for a single decompressed archive entry (32 MiB).
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Parse files on the rayon pool. Output is identical either way.
    pub parallel: bool,
    /// Archive entries larger than this are replaced by an empty placeholder
    /// carrying a warning instead of being decompressed.
    pub max_entry_bytes: u64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }
}
