//! Session Identity
//!
//! A session identifies one conversation between a mounted widget and the
//! chat backend. The id is generated once when the widget context is built
//! and sent as `user_id` with every request of that widget.
//!
//! Sessions are never persisted: reloading the host creates a new one.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet for the random suffix (lowercase base36)
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random suffix
const SUFFIX_LEN: usize = 7;

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new session ID
    ///
    /// Combines a millisecond timestamp with a random base36 suffix, e.g.
    /// `session_1718000000000_k3j9x0a`.
    #[must_use]
    pub fn create() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();

        Self(format!("session_{timestamp}_{suffix}"))
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation session
#[derive(Clone, Debug)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,
}

impl Session {
    /// Create a new session with a fresh ID
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::create(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
