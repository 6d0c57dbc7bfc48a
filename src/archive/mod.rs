mod writer;

// Re-export from submodules
pub use writer::{CLASSFILE_EXTENSION, StubArchiveWriter};
