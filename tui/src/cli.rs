//! Command-line arguments
//!
//! Flags are the embedding options of the terminal host. They override every
//! other configuration layer.

use std::path::PathBuf;

use clap::Parser;

use bookchat_core::EmbedOptions;

/// Book chat - find your next read from the terminal
#[derive(Parser, Debug)]
#[command(name = "bookchat-tui")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Chat endpoint URL
    #[arg(short = 'u', long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Amazon affiliate tag for book links
    #[arg(short = 't', long, value_name = "TAG")]
    pub affiliate_tag: Option<String>,

    /// Title shown in the header and on bot messages
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Analytics sink URL
    #[arg(long, value_name = "URL")]
    pub analytics_endpoint: Option<String>,

    /// Disable analytics
    #[arg(long)]
    pub no_analytics: bool,

    /// Configuration file path
    #[arg(short = 'c', long, env = "BOOKCHAT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Embedding options carried by the flags
    pub fn embed_options(&self) -> EmbedOptions {
        let mut options = EmbedOptions::new();
        if let Some(ref url) = self.api_url {
            options = options.with_api_url(url);
        }
        if let Some(ref tag) = self.affiliate_tag {
            options = options.with_affiliate_tag(tag);
        }
        if let Some(ref title) = self.title {
            options = options.with_widget_title(title);
        }
        if let Some(ref url) = self.analytics_endpoint {
            options = options.with_analytics_endpoint(url);
        }
        if self.no_analytics {
            options = options.with_analytics(false);
        }
        options
    }
}
