//! Bookchat TUI - Terminal host for the book chat widget
//!
//! This crate mounts the headless widget from `bookchat-core` in a
//! full-screen terminal UI.
//!
//! # Architecture
//!
//! - **Client**: Owns the embedded widget and drains its messages
//! - **Display**: Turns rendered nodes into styled terminal lines
//! - **Widgets**: Scrollable conversation view
//! - **App**: Event loop, key handling, layout

pub mod app;
pub mod cli;
pub mod client;
pub mod display;
pub mod theme;
pub mod widgets;

pub use app::App;
