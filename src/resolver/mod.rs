//! Locates the class files of a named platform module.
//!
//! The rest of the pipeline never touches the filesystem layout of a JDK;
//! it consumes `(relative path, bytes)` pairs from a [`ModuleResolver`].
//! Two layouts are supported: the packaged `jmods/` archives of an
//! installed JDK, and an exploded per-module directory tree.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use globset::GlobMatcher;
use log::{debug, trace};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::ExtractError;
use crate::utils::file_utils;

/// One candidate class file within a module.
#[derive(Debug, Clone)]
pub struct ModuleFile {
    /// Module-relative path with `/` separators,
    /// e.g. `java/lang/foreign/Arena.class`.
    pub relative_path: String,

    /// Raw class file content.
    pub bytes: Vec<u8>,
}

/// Supplies the candidate class files of a named module.
///
/// The glob is applied while collecting, so only matching entries are read
/// into memory. Implementations make no ordering promise; the caller sorts.
pub trait ModuleResolver {
    fn resolve(
        &self,
        module: &str,
        matcher: &GlobMatcher,
    ) -> Result<Vec<ModuleFile>, ExtractError>;
}

/// Resolver over the packaged `<jmods>/<module>.jmod` archives of a JDK.
#[derive(Debug)]
pub struct JmodResolver {
    /// Directory holding the platform's jmod archives.
    jmods_dir: PathBuf,
}

impl JmodResolver {
    pub fn new(jmods_dir: impl AsRef<Path>) -> Self {
        Self {
            jmods_dir: jmods_dir.as_ref().to_path_buf(),
        }
    }
}

impl ModuleResolver for JmodResolver {
    fn resolve(
        &self,
        module: &str,
        matcher: &GlobMatcher,
    ) -> Result<Vec<ModuleFile>, ExtractError> {
        let path = self.jmods_dir.join(format!("{module}.jmod"));
        if !path.is_file() {
            return Err(ExtractError::ModuleNotFound {
                module: module.to_string(),
                path,
            });
        }
        debug!("Resolving module {} from {}", module, path.display());

        let file = File::open(&path).map_err(|source| ExtractError::Io {
            path: path.clone(),
            source,
        })?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|source| ExtractError::Zip {
                path: path.clone(),
                source,
            })?;

        let mut files = Vec::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|source| ExtractError::Zip {
                path: path.clone(),
                source,
            })?;
            if !entry.is_file() {
                continue;
            }
            let name = entry.name().to_string();
            // Class content lives under the classes/ prefix inside a jmod.
            let Some(relative) = name.strip_prefix("classes/") else {
                continue;
            };
            if !relative.ends_with(".class") || relative == "module-info.class" {
                continue;
            }
            if !matcher.is_match(relative) {
                continue;
            }

            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut bytes)
                .map_err(|source| ExtractError::Io {
                    path: path.clone(),
                    source,
                })?;
            trace!("Found candidate: {}", relative);
            files.push(ModuleFile {
                relative_path: relative.to_string(),
                bytes,
            });
        }

        debug!(
            "Module {} provided {} candidate class files",
            module,
            files.len()
        );
        Ok(files)
    }
}

/// Resolver over an exploded `<root>/<module>/...` directory tree.
#[derive(Debug)]
pub struct ExplodedResolver {
    /// Directory holding one subdirectory per module.
    root: PathBuf,
}

impl ExplodedResolver {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ModuleResolver for ExplodedResolver {
    fn resolve(
        &self,
        module: &str,
        matcher: &GlobMatcher,
    ) -> Result<Vec<ModuleFile>, ExtractError> {
        let module_dir = self.root.join(module);
        if !module_dir.is_dir() {
            return Err(ExtractError::ModuleNotFound {
                module: module.to_string(),
                path: module_dir,
            });
        }
        debug!("Resolving module {} from {}", module, module_dir.display());

        let mut files = Vec::new();
        for entry in WalkDir::new(&module_dir).follow_links(true) {
            let entry = entry.map_err(|source| ExtractError::Io {
                path: module_dir.clone(),
                source: source.into(),
            })?;
            if !entry.file_type().is_file() || !file_utils::has_extension(entry.path(), "class") {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&module_dir)
                .map_err(|_| ExtractError::ModuleNotFound {
                    module: module.to_string(),
                    path: entry.path().to_path_buf(),
                })?
                .to_string_lossy()
                .replace('\\', "/");
            if relative == "module-info.class" || !matcher.is_match(&relative) {
                continue;
            }

            let bytes =
                file_utils::read_file_bytes(entry.path()).map_err(|source| ExtractError::Io {
                    path: entry.path().to_path_buf(),
                    source,
                })?;
            trace!("Found candidate: {}", relative);
            files.push(ModuleFile {
                relative_path: relative,
                bytes,
            });
        }

        debug!(
            "Module {} provided {} candidate class files",
            module,
            files.len()
        );
        Ok(files)
    }
}
