//! Theme and Colors
//!
//! The book chat palette: warm paper tones for the bot, green for the reader.

use ratatui::style::Color;

// ============================================================================
// Conversation Colors
// ============================================================================

/// Bot text - warm amber
pub const BOT_ACCENT: Color = Color::Rgb(230, 180, 100);

/// User input green
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// Suggestion chip
pub const CHIP: Color = Color::Rgb(150, 180, 255);

/// Selected suggestion chip
pub const CHIP_SELECTED: Color = Color::Rgb(200, 220, 255);

/// Book links
pub const LINK_BLUE: Color = Color::Rgb(100, 180, 255);

// ============================================================================
// UI Colors
// ============================================================================

/// Header bar
pub const HEADER: Color = Color::Rgb(180, 120, 70);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Edge fade, outermost line
pub const FADE_FAR: Color = Color::Rgb(80, 80, 80);

/// Edge fade, second line
pub const FADE_NEAR: Color = Color::Rgb(120, 120, 120);
