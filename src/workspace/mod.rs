//! Workspace path resolution
//!
//! Tool arguments name files relative to the client's workspace; these helpers
//! turn them into paths the Java tooling can use from any working directory.

#[cfg(test)]
mod tests;

use glob::{MatchOptions, glob_with};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{JavaTestError, Result};

/// Platform classpath separator (`:` on Unix, `;` on Windows)
#[cfg(windows)]
pub const CLASSPATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const CLASSPATH_SEPARATOR: char = ':';

/// Resolve `path` against `workspace` unless it is already absolute
#[inline]
pub fn resolve_workspace_path(path: &str, workspace: &Path) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        workspace.join(candidate)
    }
}

/// Resolve every classpath entry against the workspace.
///
/// An empty classpath becomes `"."`. Wildcard entries such as `lib/*` are
/// passed through (after resolution) for the JVM to expand.
#[inline]
pub fn resolve_classpath(classpath: &str, workspace: &Path) -> String {
    if classpath.is_empty() {
        return ".".to_string();
    }

    let entries: Vec<String> = classpath
        .split(CLASSPATH_SEPARATOR)
        .map(|entry| {
            resolve_workspace_path(entry, workspace)
                .to_string_lossy()
                .into_owned()
        })
        .collect();

    join_classpath(entries)
}

/// Join classpath fragments, skipping empty ones
#[inline]
pub fn join_classpath<I, S>(entries: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for entry in entries {
        let entry = entry.as_ref();
        if entry.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push(CLASSPATH_SEPARATOR);
        }
        joined.push_str(entry);
    }
    joined
}

/// Expand a list of source files and glob patterns.
///
/// Plain entries are resolved without checking that they exist (javac reports
/// missing files itself). Patterns containing `*` are expanded relative to the
/// workspace; `**` matches across directories.
#[inline]
pub fn resolve_file_list(files: &[String], workspace: &Path) -> Result<Vec<String>> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut resolved = Vec::new();
    for file in files {
        let path = resolve_workspace_path(file, workspace);
        let path = path.to_string_lossy().into_owned();

        if !file.contains('*') {
            resolved.push(path);
            continue;
        }

        let matches = glob_with(&path, options).map_err(|e| {
            JavaTestError::Workspace(format!("Invalid file pattern '{}': {}", file, e))
        })?;

        let mut expanded: Vec<String> = matches
            .filter_map(|entry| match entry {
                Ok(p) => Some(p.to_string_lossy().into_owned()),
                Err(e) => {
                    warn!("Skipping unreadable path while expanding '{}': {}", file, e);
                    None
                }
            })
            .collect();
        expanded.sort();

        debug!("Pattern '{}' matched {} files", file, expanded.len());
        resolved.extend(expanded);
    }

    Ok(resolved)
}
