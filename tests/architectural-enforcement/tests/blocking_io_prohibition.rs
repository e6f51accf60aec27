//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Network access in production code goes through async clients.
//! **Acceptable**: Reading the config file and opening the log file during
//! startup, before the event loop runs.

use architectural_enforcement::{code_part, rust_sources};

const FORBIDDEN: &[&str] = &[
    "reqwest::blocking",
    "std::net::TcpStream",
    "std::net::TcpListener",
    "std::net::UdpSocket",
    "std::thread::sleep",
    "std::process::Command",
];

/// Files allowed to touch `std::fs` (startup only)
const STARTUP_FILES: &[&str] = &["widget/core/src/config/mod.rs", "tui/src/main.rs"];

#[test]
fn test_no_blocking_io_in_production_code() {
    let mut violations = Vec::new();

    for dir in ["widget/core/src", "tui/src"] {
        for file in rust_sources(dir) {
            let startup = STARTUP_FILES.iter().any(|s| file.path.ends_with(s));

            for (line_number, line) in file.production_lines() {
                let code = code_part(line);
                let forbidden = FORBIDDEN.iter().find(|pattern| code.contains(*pattern));
                let blocking_fs = !startup && code.contains("std::fs");

                if forbidden.is_some() || blocking_fs {
                    violations.push(format!(
                        "{}:{} - {}",
                        file.path.display(),
                        line_number,
                        line.trim()
                    ));
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\nBlocking I/O found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        panic!(
            "\nFound {} blocking I/O violation(s) in production code.",
            violations.len()
        );
    }
}
