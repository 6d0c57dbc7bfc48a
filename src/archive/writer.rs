//! Deterministic zip emission for transformed stubs.

use std::collections::{BTreeMap, HashSet};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};
use once_cell::sync::Lazy;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::ExtractError;

/// File extension of emitted stub entries.
pub const CLASSFILE_EXTENSION: &str = "class";

/// Fixed last-modified timestamp stamped on every entry of every run
/// (2022-01-01T00:00:00), so repeated runs over identical input produce
/// byte-identical archives.
static FIXED_ENTRY_TIME: Lazy<DateTime> =
    Lazy::new(|| DateTime::from_date_and_time(2022, 1, 1, 0, 0, 0).expect("fixed entry timestamp"));

/// Writes stub entries into one zip container.
///
/// Entries are appended in the lexicographic name order the stub map
/// provides, each carrying the fixed timestamp; the container is closed
/// exactly once via [`StubArchiveWriter::finish`].
pub struct StubArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,

    /// Destination path, for error reporting only.
    path: PathBuf,
}

impl<W: Write + Seek> StubArchiveWriter<W> {
    pub fn new(inner: W, path: impl AsRef<Path>) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one module's stubs, restricted to the include set.
    ///
    /// Names in the include set without a transformed stub (supertypes
    /// outside the scanned set) are skipped without error. Returns the
    /// number of entries written.
    pub fn append_module(
        &mut self,
        stubs: &BTreeMap<String, Vec<u8>>,
        include: &HashSet<String>,
    ) -> Result<usize, ExtractError> {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(*FIXED_ENTRY_TIME);

        let mut written = 0;
        for (name, bytes) in stubs {
            if !include.contains(name) {
                trace!("Skipping non-included class: {}", name);
                continue;
            }
            debug!("Writing stub for class: {}", name);
            let entry_name = format!("{name}.{CLASSFILE_EXTENSION}");
            self.zip
                .start_file(entry_name, options)
                .map_err(|source| ExtractError::Zip {
                    path: self.path.clone(),
                    source,
                })?;
            self.zip
                .write_all(bytes)
                .map_err(|source| ExtractError::Io {
                    path: self.path.clone(),
                    source,
                })?;
            written += 1;
        }
        Ok(written)
    }

    /// Close the container and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, ExtractError> {
        self.zip.finish().map_err(|source| ExtractError::Zip {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use zip::ZipArchive;

    fn stubs(entries: &[(&str, &[u8])]) -> BTreeMap<String, Vec<u8>> {
        entries
            .iter()
            .map(|(name, bytes)| (name.to_string(), bytes.to_vec()))
            .collect()
    }

    fn include(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn build(stubs: &BTreeMap<String, Vec<u8>>, include: &HashSet<String>) -> Vec<u8> {
        let mut writer = StubArchiveWriter::new(Cursor::new(Vec::new()), "test.zip");
        writer.append_module(stubs, include).expect("append");
        writer.finish().expect("finish").into_inner()
    }

    #[test]
    fn entries_are_sorted_and_carry_the_fixed_timestamp() {
        let bytes = build(
            &stubs(&[("b/Late", b"late"), ("a/Early", b"early")]),
            &include(&["a/Early", "b/Late"]),
        );

        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("reopen");
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).expect("entry").name().to_string())
            .collect();
        assert_eq!(names, ["a/Early.class", "b/Late.class"]);

        let entry = archive.by_name("a/Early.class").expect("entry");
        let modified = entry.last_modified();
        assert_eq!(
            (modified.year(), modified.month(), modified.day()),
            (2022, 1, 1)
        );
        assert_eq!(
            (modified.hour(), modified.minute(), modified.second()),
            (0, 0, 0)
        );
    }

    #[test]
    fn restricts_output_to_the_include_set() {
        let bytes = build(
            &stubs(&[("a/Kept", b"kept"), ("a/Dropped", b"dropped")]),
            &include(&["a/Kept"]),
        );

        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("reopen");
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.by_index(0).expect("entry").name(), "a/Kept.class");
    }

    #[test]
    fn silently_skips_included_names_without_stubs() {
        let map = stubs(&[("a/Present", b"present")]);
        let mut writer = StubArchiveWriter::new(Cursor::new(Vec::new()), "test.zip");
        let written = writer
            .append_module(&map, &include(&["a/Present", "java/lang/Object"]))
            .expect("append");
        assert_eq!(written, 1);
    }

    #[test]
    fn reprocessing_the_same_input_is_byte_identical() {
        let map = stubs(&[("a/One", b"one"), ("a/Two", b"two")]);
        let names = include(&["a/One", "a/Two"]);
        assert_eq!(build(&map, &names), build(&map, &names));
    }
}
