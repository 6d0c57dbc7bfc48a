//! Drives the per-module scan → transform → write pipeline.

mod stats;

use std::collections::BTreeMap;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::archive::StubArchiveWriter;
use crate::classfile::{parse_class, write_class};
use crate::config;
use crate::error::ExtractError;
use crate::resolver::ModuleResolver;
use crate::stub::{InclusionClosure, strip_class};
use crate::utils::{file_utils, hash_utils};

// Re-export from submodules
pub use stats::ExtractStats;

/// Orchestrates one extraction run over a module resolver.
///
/// Processing is strictly sequential: modules one at a time, each scanned,
/// transformed, and written before the next starts. The output archive
/// handle is owned here for the whole run and closed exactly once.
pub struct StubExtractor<R: ModuleResolver> {
    /// Source of module class files
    resolver: R,
}

impl<R: ModuleResolver> StubExtractor<R> {
    /// Create a new extractor over the given resolver
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Run a full extraction for `target_version` into `output_path`.
    ///
    /// The run aborts before the output path is touched when the running
    /// platform version does not match the target, or when no modules are
    /// configured for the target. The archive is assembled in a temporary
    /// file and persisted to `output_path` only after every module
    /// succeeded, so a failed run never leaves a partial archive behind.
    pub fn run(
        &self,
        target_version: u32,
        running_version: u32,
        output_path: &Path,
    ) -> Result<ExtractStats, ExtractError> {
        // The version gate comes before anything touches the output path.
        if running_version != target_version {
            return Err(ExtractError::VersionMismatch {
                running: running_version,
                requested: target_version,
            });
        }
        let modules = config::modules_for(target_version)
            .ok_or(ExtractError::UnsupportedVersion(target_version))?;

        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        file_utils::ensure_dir_exists(&parent).map_err(|source| ExtractError::Io {
            path: parent.clone(),
            source,
        })?;
        let temp = NamedTempFile::new_in(&parent).map_err(|source| ExtractError::Io {
            path: parent.clone(),
            source,
        })?;
        let mut archive = StubArchiveWriter::new(temp, output_path);

        let mut stats = ExtractStats::new();
        for module in modules {
            let module_stats = self.process_module(module, &mut archive)?;
            stats.merge(&module_stats);
        }

        let temp = archive.finish()?;
        temp.persist(output_path)
            .map_err(|error| ExtractError::Io {
                path: output_path.to_path_buf(),
                source: error.error,
            })?;

        let digest = hash_utils::hash_file(output_path).map_err(|source| ExtractError::Io {
            path: output_path.to_path_buf(),
            source,
        })?;
        info!("Wrote {} (sha256 {})", output_path.display(), digest);
        Ok(stats)
    }

    /// Scan, transform, and write one module.
    fn process_module<W: Write + Seek>(
        &self,
        module: &str,
        archive: &mut StubArchiveWriter<W>,
    ) -> Result<ExtractStats, ExtractError> {
        let spec = config::module_spec(module)
            .ok_or_else(|| ExtractError::UnconfiguredModule(module.to_string()))?;
        let matcher = spec.matcher()?;

        info!("Prescanning class files for module [{}]", module);
        let mut candidates = self.resolver.resolve(module, &matcher)?;
        candidates.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let mut records = Vec::with_capacity(candidates.len());
        for file in &candidates {
            let record = parse_class(&file.bytes).map_err(|source| ExtractError::Parse {
                path: PathBuf::from(&file.relative_path),
                source,
            })?;
            records.push(record);
        }

        info!(
            "Transforming {} class files for module [{}]",
            records.len(),
            module
        );
        let mut closure = InclusionClosure::new();
        for record in &records {
            closure.record(record);
        }

        // Every scanned class is transformed; which of them are written is
        // only known once the whole module has been visited.
        let mut stubs = BTreeMap::new();
        for record in &records {
            let stub = strip_class(record);
            let bytes = write_class(&stub).map_err(|source| ExtractError::Write {
                class: record.name.clone(),
                source,
            })?;
            stubs.insert(record.name.clone(), bytes);
        }

        info!("Writing visible class stubs for module [{}]", module);
        let written = archive.append_module(&stubs, closure.include())?;
        debug!(
            "Module [{}]: {} of {} scanned classes written",
            module,
            written,
            records.len()
        );

        Ok(ExtractStats {
            modules_processed: 1,
            candidate_files: candidates.len(),
            parsed_classes: records.len(),
            visible_classes: closure.visible().len(),
            stubs_written: written,
        })
    }
}
