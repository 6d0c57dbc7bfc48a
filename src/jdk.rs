//! Discovery of the Java runtime the tool itself is running against.
//!
//! The extractor may only stub the platform it is actually executing on, so
//! the running JDK's feature version is detected up front and compared to
//! the requested target before anything else happens.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::ExtractError;

/// The Java runtime found on this machine.
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    /// Installation root of the runtime.
    pub java_home: PathBuf,

    /// Feature version, e.g. 20 for `20.0.1`.
    pub major_version: u32,
}

impl RuntimeInfo {
    /// Directory holding the runtime's packaged module archives.
    pub fn jmods_dir(&self) -> PathBuf {
        self.java_home.join("jmods")
    }
}

/// Locate the running JDK and determine its feature version.
pub fn detect_runtime() -> Result<RuntimeInfo, ExtractError> {
    let java_home = find_java_home().ok_or_else(|| {
        ExtractError::JdkNotFound("set JAVA_HOME or put 'java' on the PATH".to_string())
    })?;
    let major_version = query_major_version(&java_home)?;
    debug!(
        "Detected Java {} at {}",
        major_version,
        java_home.display()
    );
    Ok(RuntimeInfo {
        java_home,
        major_version,
    })
}

fn find_java_home() -> Option<PathBuf> {
    if let Ok(value) = env::var("JAVA_HOME") {
        let candidate = PathBuf::from(value);
        if candidate.join("bin").join(java_executable()).exists() {
            return Some(candidate);
        }
    }

    let java_path = which::which("java").ok()?;
    let bin_dir = java_path.parent()?;
    bin_dir.parent().map(Path::to_path_buf)
}

fn query_major_version(java_home: &Path) -> Result<u32, ExtractError> {
    let java_exe = java_home.join("bin").join(java_executable());
    let output = Command::new(&java_exe)
        .arg("-version")
        .output()
        .map_err(|error| {
            ExtractError::JdkNotFound(format!(
                "failed to run '{} -version': {}",
                java_exe.display(),
                error
            ))
        })?;

    // `java -version` historically reports on stderr.
    let mut report = String::from_utf8_lossy(&output.stderr).to_string();
    if report.trim().is_empty() {
        report = String::from_utf8_lossy(&output.stdout).to_string();
    }

    parse_major_version(&report).ok_or_else(|| {
        ExtractError::JdkVersionParse(report.lines().next().unwrap_or_default().to_string())
    })
}

fn parse_major_version(output: &str) -> Option<u32> {
    interpret_version_token(extract_version_token(output)?)
}

/// Pull the quoted version token out of a `java -version` report.
fn extract_version_token(output: &str) -> Option<&str> {
    for line in output.lines() {
        if let Some(start) = line.find('"') {
            let rest = &line[start + 1..];
            if let Some(end) = rest.find('"') {
                return Some(&rest[..end]);
            }
        }
    }
    None
}

/// Map a version token to its feature version, accepting both the legacy
/// `1.8.0_362` and the modern `20.0.1` / `25-ea` shapes.
fn interpret_version_token(token: &str) -> Option<u32> {
    let effective = token.strip_prefix("1.").unwrap_or(token);
    let digits: String = effective
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse::<u32>().ok()
    }
}

fn java_executable() -> &'static str {
    if cfg!(windows) { "java.exe" } else { "java" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interprets_modern_version_tokens() {
        assert_eq!(interpret_version_token("20.0.1"), Some(20));
        assert_eq!(interpret_version_token("19"), Some(19));
        assert_eq!(interpret_version_token("25-ea"), Some(25));
    }

    #[test]
    fn interprets_legacy_version_tokens() {
        assert_eq!(interpret_version_token("1.8.0_362"), Some(8));
    }

    #[test]
    fn rejects_garbage_tokens() {
        assert_eq!(interpret_version_token("unknown"), None);
    }

    #[test]
    fn extracts_the_quoted_token_from_a_version_report() {
        let report = r#"openjdk version "20.0.1" 2023-04-18
OpenJDK Runtime Environment (build 20.0.1+9)
OpenJDK 64-Bit Server VM (build 20.0.1+9)"#;
        assert_eq!(extract_version_token(report), Some("20.0.1"));
        assert_eq!(parse_major_version(report), Some(20));
    }

    #[test]
    fn handles_reports_without_a_version_line() {
        assert_eq!(parse_major_version("no version here"), None);
    }
}
