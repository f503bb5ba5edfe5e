//! In-memory event sink for testing and development

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::traits::EventSink;
use crate::types::{ClassificationEvent, ReconcileResult};

/// In-memory implementation of [`EventSink`] collecting published events
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<RwLock<Vec<ClassificationEvent>>>,
}

impl MemorySink {
    /// Create a new memory sink instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events published so far, oldest first
    pub fn events(&self) -> Vec<ClassificationEvent> {
        self.events.read().unwrap().clone()
    }

    /// Clear all collected events (useful for testing)
    pub fn clear(&self) {
        self.events.write().unwrap().clear();
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn publish(&self, event: &ClassificationEvent) -> ReconcileResult<()> {
        self.events.write().unwrap().push(event.clone());
        Ok(())
    }
}
