//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Waiting happens on
//! channels and I/O.
//! **Exceptions**: Frame rate limiting in the terminal event loop, test code.

use architectural_enforcement::{code_part, rust_sources, SourceFile};

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for file in rust_sources("widget/core/src") {
        check_file(&file, false, &mut violations);
    }
    for file in rust_sources("tui/src") {
        check_file(&file, true, &mut violations);
    }

    if !violations.is_empty() {
        eprintln!("\nSleep calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nAcceptable: frame rate limiting in tui/src/app.rs, test code.");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}

fn check_file(file: &SourceFile, allow_frame_limiting: bool, violations: &mut Vec<String>) {
    let lines: Vec<&str> = file.lines.iter().map(String::as_str).collect();

    for (line_number, line) in file.production_lines() {
        let code = code_part(line);
        if !(code.contains("::sleep(") || code.contains(".sleep(")) {
            continue;
        }

        if allow_frame_limiting
            && file.path.ends_with("tui/src/app.rs")
            && is_frame_limiting_context(&lines, line_number - 1)
        {
            continue;
        }

        violations.push(format!(
            "{}:{} - {}",
            file.path.display(),
            line_number,
            line.trim()
        ));
    }
}

/// Check if sleep is used for frame rate limiting (acceptable in the TUI)
fn is_frame_limiting_context(lines: &[&str], current_idx: usize) -> bool {
    let context_range = current_idx.saturating_sub(10)..std::cmp::min(current_idx + 5, lines.len());

    lines[context_range].iter().any(|line| {
        let line = line.to_lowercase();
        line.contains("frame") || line.contains("fps") || line.contains("rate limit")
    })
}

#[test]
fn test_frame_limiting_detection() {
    let lines = [
        "let frame_duration = Duration::from_millis(50);",
        "if elapsed < frame_duration {",
        "    tokio::time::sleep(frame_duration - elapsed).await;",
        "}",
    ];
    assert!(is_frame_limiting_context(&lines, 2));

    let lines = ["loop {", "    tokio::time::sleep(Duration::from_secs(1)).await;", "}"];
    assert!(!is_frame_limiting_context(&lines, 1));
}
