//! Background Task Channel
//!
//! A single worker task that runs side work for the widget: keyword
//! extraction on user messages and posting analytics events. Communication is
//! two-way but never blocking. Tasks go in through a bounded queue and results
//! come back through registered callbacks.
//!
//! Results are advisory. The widget logs them and never folds them into the
//! conversation.
//!
//! # Degradation
//!
//! Without a tokio runtime the channel cannot start. Callers fall back to
//! [`BackgroundChannel::disabled`], which drops every submission.

mod analytics;
mod keywords;

pub use analytics::{
    AnalyticsEvent, AnalyticsEventKind, AnalyticsSink, HttpAnalyticsSink, NullSink,
    ANALYTICS_TIMEOUT,
};
pub use keywords::{extract_keywords, GENRE_KEYWORDS};

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::WidgetError;

/// Capacity of the submission queue
pub const QUEUE_CAPACITY: usize = 64;

/// Work for the background worker
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundTask {
    /// Analyze a user message
    ProcessMessage {
        /// Message text
        text: String,
    },
    /// Post an analytics event
    TrackAnalytics {
        /// Event envelope
        event: serde_json::Value,
    },
}

/// Outcome of a background task
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackgroundResult {
    /// A message was analyzed
    MessageProcessed {
        /// Always true
        processed: bool,
        /// Message length in UTF-16 code units
        length: usize,
        /// Genres mentioned, in vocabulary order
        keywords: Vec<String>,
    },
    /// An analytics event was handed to the sink
    AnalyticsTracked {
        /// Whether the sink accepted it
        success: bool,
        /// The event
        event: serde_json::Value,
    },
    /// The task could not be handled
    Error {
        /// What went wrong
        error: String,
    },
}

type ResultCallback = Box<dyn Fn(&BackgroundResult) + Send + Sync>;

#[derive(Default)]
struct CallbackRegistry {
    callbacks: Mutex<Vec<ResultCallback>>,
}

impl CallbackRegistry {
    fn deliver(&self, result: &BackgroundResult) {
        for callback in self.callbacks.lock().iter() {
            callback(result);
        }
    }
}

/// Handle to the background worker
///
/// Cloning shares the same worker and callbacks.
#[derive(Clone)]
pub struct BackgroundChannel {
    tx: Option<mpsc::Sender<BackgroundTask>>,
    registry: Arc<CallbackRegistry>,
}

impl BackgroundChannel {
    /// Start the worker on the current tokio runtime
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WorkerUnavailable`] when called outside a
    /// runtime.
    pub fn start(sink: Arc<dyn AnalyticsSink>) -> Result<Self, WidgetError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| WidgetError::WorkerUnavailable(e.to_string()))?;

        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let registry = Arc::new(CallbackRegistry::default());

        handle.spawn(run_worker(rx, sink, Arc::clone(&registry)));
        tracing::debug!("Background worker started");

        Ok(Self {
            tx: Some(tx),
            registry,
        })
    }

    /// A channel that drops everything
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            tx: None,
            registry: Arc::new(CallbackRegistry::default()),
        }
    }

    /// Whether a worker is running behind this handle
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Register a result callback
    pub fn on_result<F>(&self, callback: F)
    where
        F: Fn(&BackgroundResult) + Send + Sync + 'static,
    {
        self.registry.callbacks.lock().push(Box::new(callback));
    }

    /// Queue a task without waiting
    ///
    /// A full or closed queue drops the task.
    pub fn submit(&self, task: BackgroundTask) {
        let Some(ref tx) = self.tx else {
            tracing::debug!(?task, "Background channel disabled, dropping task");
            return;
        };

        if let Err(e) = tx.try_send(task) {
            tracing::warn!("Dropping background task: {}", e);
        }
    }

    /// Queue a task given in its JSON form
    ///
    /// Accepts `{"type": "process_message", "message": ...}` and
    /// `{"type": "track_analytics", "event": {...}}`. Anything else is
    /// answered with an error result.
    pub fn submit_raw(&self, raw: serde_json::Value) {
        if self.tx.is_none() {
            tracing::debug!("Background channel disabled, dropping raw task");
            return;
        }

        match parse_raw(raw) {
            Ok(task) => self.submit(task),
            Err(error) => self.registry.deliver(&BackgroundResult::Error { error }),
        }
    }

    /// Queue keyword extraction for a message
    pub fn process_message(&self, text: &str) {
        self.submit(BackgroundTask::ProcessMessage {
            text: text.to_string(),
        });
    }

    /// Queue an analytics event
    pub fn track(&self, event: &AnalyticsEvent) {
        match serde_json::to_value(event) {
            Ok(event) => self.submit(BackgroundTask::TrackAnalytics { event }),
            Err(e) => tracing::warn!("Cannot encode analytics event: {}", e),
        }
    }
}

impl std::fmt::Debug for BackgroundChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundChannel")
            .field("enabled", &self.is_enabled())
            .field("callbacks", &self.registry.callbacks.lock().len())
            .finish()
    }
}

fn parse_raw(raw: serde_json::Value) -> Result<BackgroundTask, String> {
    match raw.get("type").and_then(|t| t.as_str()) {
        Some("process_message") => raw
            .get("message")
            .and_then(|m| m.as_str())
            .map(|text| BackgroundTask::ProcessMessage {
                text: text.to_string(),
            })
            .ok_or_else(|| "Invalid process_message: missing message".to_string()),
        Some("track_analytics") => Ok(BackgroundTask::TrackAnalytics {
            event: raw.get("event").cloned().unwrap_or(serde_json::Value::Null),
        }),
        _ => Err("Unknown message type".to_string()),
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<BackgroundTask>,
    sink: Arc<dyn AnalyticsSink>,
    registry: Arc<CallbackRegistry>,
) {
    while let Some(task) = rx.recv().await {
        match task {
            BackgroundTask::ProcessMessage { text } => {
                registry.deliver(&process_message(&text));
            }
            // A slow sink must not hold up the queue
            BackgroundTask::TrackAnalytics { event } => {
                let sink = Arc::clone(&sink);
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    let result = track_event(event, sink.as_ref()).await;
                    registry.deliver(&result);
                });
            }
        }
    }
    tracing::debug!("Background worker stopped");
}

fn process_message(text: &str) -> BackgroundResult {
    BackgroundResult::MessageProcessed {
        processed: true,
        length: text.encode_utf16().count(),
        keywords: extract_keywords(text),
    }
}

async fn track_event(event: serde_json::Value, sink: &dyn AnalyticsSink) -> BackgroundResult {
    match sink.track(&event).await {
        Ok(success) => BackgroundResult::AnalyticsTracked { success, event },
        Err(e) => BackgroundResult::Error {
            error: format!("Analytics error: {e}"),
        },
    }
}
