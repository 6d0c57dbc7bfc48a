pub mod archive;
pub mod classfile;
pub mod config;
pub mod error;
pub mod extractor;
pub mod jdk;
pub mod resolver;
pub mod stub;
pub mod utils;

// Re-export main types and functions for easier access
pub use classfile::types::ClassRecord;
pub use classfile::{ClassParseError, parse_class, write_class};
pub use error::ExtractError;
pub use extractor::{ExtractStats, StubExtractor};
pub use jdk::{RuntimeInfo, detect_runtime};
pub use resolver::{ExplodedResolver, JmodResolver, ModuleFile, ModuleResolver};
pub use stub::{InclusionClosure, is_visible, strip_class};

// Re-export utility functions
pub use utils::hash_utils;
