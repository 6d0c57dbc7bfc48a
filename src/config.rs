//! Static extraction configuration.
//!
//! Which modules are stubbed for which platform version, and which class
//! files within each module are candidates, is compiled in. The tables are
//! immutable and handed to the orchestrator through the lookup functions
//! below; no other component reads them directly.

use std::collections::BTreeMap;

use globset::{GlobBuilder, GlobMatcher};
use once_cell::sync::Lazy;

use crate::error::ExtractError;

/// Ordered list of modules to process, per supported platform version.
static MODULES_TO_PROCESS: Lazy<BTreeMap<u32, Vec<&'static str>>> = Lazy::new(|| {
    BTreeMap::from([
        (19, vec!["java.base"]),
        (20, vec!["java.base", "jdk.incubator.vector"]),
    ])
});

/// Glob selecting candidate class files, per module.
static CLASSFILE_MATCHERS: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "java.base",
            "java/{lang/foreign/*,nio/channels/FileChannel}.class",
        ),
        ("jdk.incubator.vector", "jdk/incubator/vector/*.class"),
    ])
});

/// Selection of candidate class files within one platform module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleSpec {
    /// Module identifier, e.g. `java.base`.
    pub module: &'static str,

    /// Glob over module-relative paths, with `/` as a literal separator.
    pub pattern: &'static str,
}

impl ModuleSpec {
    /// Compile the glob pattern. `*` does not cross path separators, the
    /// same semantics the platform's own path matcher applies.
    pub fn matcher(&self) -> Result<GlobMatcher, ExtractError> {
        let glob = GlobBuilder::new(self.pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| ExtractError::InvalidPattern {
                module: self.module.to_string(),
                source,
            })?;
        Ok(glob.compile_matcher())
    }
}

/// The modules to process for a platform version, in processing order.
pub fn modules_for(version: u32) -> Option<&'static [&'static str]> {
    MODULES_TO_PROCESS.get(&version).map(|list| list.as_slice())
}

/// The candidate-file selection for one module.
pub fn module_spec(module: &str) -> Option<ModuleSpec> {
    CLASSFILE_MATCHERS
        .get_key_value(module)
        .map(|(module, pattern)| ModuleSpec {
            module: *module,
            pattern: *pattern,
        })
}
