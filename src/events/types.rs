//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};

/// All events emitted while a pipeline runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Executor events
    Run(RunEvent),
}

/// Events emitted by the executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// The source layer listed its items
    Started { total_items: usize },
    /// An item went through every layer
    ItemCompleted(ItemProgress),
    /// An item failed; `completed` counts it like [`ItemProgress::completed`]
    ItemFailed {
        identifier: String,
        message: String,
        completed: usize,
    },
    /// All items were pulled from the source
    Completed { summary: RunSummary },
    /// The run aborted on an error
    Aborted { message: String },
}

/// Progress information after one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemProgress {
    /// Identifier of the item, usually its file name
    pub identifier: String,
    /// Items handled so far, failed ones included
    pub completed: usize,
    /// Items listed by the source
    pub total: usize,
    /// Images left in the batch after the last layer
    pub images_out: usize,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_items: usize,
    pub processed_items: usize,
    pub failed_items: usize,
    pub images_out: usize,
    pub duration_ms: u64,
}
