//! Log Capture Utilities for Testing
//!
//! Provides tracing log capture and assertion utilities

use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

/// Captured log record
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

/// Log capture layer for testing
#[derive(Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the default subscriber for the current thread
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Messages at `level` containing `pattern`
    pub fn matching(&self, level: Level, pattern: &str) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level && r.message.contains(pattern))
            .map(|r| r.message)
            .collect()
    }

    pub fn assert_contains(&self, level: Level, pattern: &str) {
        assert!(
            !self.matching(level, pattern).is_empty(),
            "Expected {} log matching '{}', but none found. All logs:\n{}",
            level,
            pattern,
            self.records()
                .iter()
                .map(|r| format!("{} {}", r.level, r.message))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

impl<S> tracing_subscriber::Layer<S> for LogCapture
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        use tracing::field::Visit;

        struct MessageVisitor {
            message: String,
        }

        impl Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{:?}", value);
                }
            }
        }

        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        self.records.lock().unwrap().push(LogRecord {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}
