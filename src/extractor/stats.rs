use serde::Serialize;

/// Statistics for one extraction run
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExtractStats {
    /// Number of modules processed
    pub modules_processed: usize,

    /// Candidate class files matched by the module patterns
    pub candidate_files: usize,

    /// Class files parsed into structural records
    pub parsed_classes: usize,

    /// Classes that are themselves part of the API surface
    pub visible_classes: usize,

    /// Stub entries written into the archive
    pub stubs_written: usize,
}

impl ExtractStats {
    /// Create a new stats instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another stats instance into this one
    pub fn merge(&mut self, other: &Self) {
        self.modules_processed += other.modules_processed;
        self.candidate_files += other.candidate_files;
        self.parsed_classes += other.parsed_classes;
        self.visible_classes += other.visible_classes;
        self.stubs_written += other.stubs_written;
    }

    /// Share of scanned classes that ended up in the archive, in percent
    pub fn retention_rate(&self) -> f64 {
        if self.parsed_classes == 0 {
            return 0.0;
        }
        (self.stubs_written as f64 / self.parsed_classes as f64) * 100.0
    }
}
