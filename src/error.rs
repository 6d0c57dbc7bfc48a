use std::io;
use std::path::PathBuf;

use thiserror::Error;
use zip::result::ZipError;

use crate::classfile::reader::ClassParseError;
use crate::classfile::writer::ClassWriteError;

/// Fatal failures of an extraction run.
///
/// Every variant aborts the whole run; nothing here is recoverable locally,
/// and no partial archive survives any of them.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("running platform version {running} does not match requested target {requested}")]
    VersionMismatch { running: u32, requested: u32 },

    #[error("no modules are configured for platform version {0}")]
    UnsupportedVersion(u32),

    #[error("unable to locate a Java runtime: {0}")]
    JdkNotFound(String),

    #[error("failed to determine the running Java version: {0}")]
    JdkVersionParse(String),

    #[error("module {module} could not be located at {path}")]
    ModuleNotFound { module: String, path: PathBuf },

    #[error("module {0} has no classfile pattern configured")]
    UnconfiguredModule(String),

    #[error("invalid class file pattern for module {module}: {source}")]
    InvalidPattern {
        module: String,
        #[source]
        source: globset::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("archive error at {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("failed to parse class file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ClassParseError,
    },

    #[error("failed to serialize stub for class {class}: {source}")]
    Write {
        class: String,
        #[source]
        source: ClassWriteError,
    },
}
