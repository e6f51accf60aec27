//! Integration Test: Headless Core
//!
//! **Policy**: `bookchat-core` never depends on a UI framework. Hosts depend on
//! the core, not the other way round.

use std::fs;

use architectural_enforcement::{code_part, rust_sources, workspace_root};

const UI_CRATES: &[&str] = &["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("widget/core/Cargo.toml"))
        .expect("core manifest");

    for krate in UI_CRATES {
        assert!(
            !manifest.lines().any(|l| l.trim_start().starts_with(krate)),
            "widget/core/Cargo.toml depends on {krate}"
        );
    }
}

#[test]
fn test_core_sources_do_not_use_ui_crates() {
    let mut violations = Vec::new();

    for file in rust_sources("widget/core") {
        for (idx, line) in file.lines.iter().enumerate() {
            let code = code_part(line);
            if UI_CRATES.iter().any(|k| code.contains(&format!("{k}::"))) {
                violations.push(format!("{}:{}", file.path.display(), idx + 1));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "UI crate used in the core: {violations:?}"
    );
}

#[test]
fn test_host_depends_on_core() {
    let manifest =
        fs::read_to_string(workspace_root().join("tui/Cargo.toml")).expect("tui manifest");
    assert!(manifest.contains("bookchat-core = { path = \"../widget/core\" }"));
}
