//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The widget core stays free of terminal dependencies
//! - No sleep() calls in production code
//! - No blocking network I/O
//!
//! The helpers here locate the workspace and walk its Rust sources so each
//! test only states its rule.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root (two levels above this package)
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// A Rust source file and its lines
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// File content split into lines
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Lines before the first `#[cfg(test)]`, with their 1-based numbers
    ///
    /// Test modules sit at the end of each file in this workspace.
    pub fn production_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .take_while(|line| line.trim() != "#[cfg(test)]")
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.as_str()))
    }
}

/// All `.rs` files under `dir` (relative to the workspace root)
pub fn rust_sources(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root();
    let base = root.join(dir);
    if !base.exists() {
        panic!("{} does not exist", base.display());
    }

    walkdir::WalkDir::new(&base)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| {
            let content = fs::read_to_string(e.path()).ok()?;
            Some(SourceFile {
                path: e
                    .path()
                    .strip_prefix(&root)
                    .unwrap_or(e.path())
                    .to_path_buf(),
                lines: content.lines().map(str::to_string).collect(),
            })
        })
        .collect()
}

/// Code part of a line (comments dropped)
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}
