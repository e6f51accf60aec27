//! Chat Backend Integration
//!
//! Access to the remote chat endpoint through the [`ChatTransport`] trait.
//!
//! # Usage
//!
//! ```ignore
//! use bookchat_core::transport::{ChatTransport, HttpTransport};
//!
//! let transport = HttpTransport::new("http://localhost:8005/api/chat", None)?;
//! let response = transport.send(&session_id, "").await?;
//! ```

mod http;
mod traits;

pub use http::HttpTransport;
pub use traits::ChatTransport;
