//! # Pipeline Module
//!
//! Composes layers and runs them.
//!
//! ## Lifecycle
//! 1. **Building** - `add` appends layers, checking each against its predecessor
//! 2. **Frozen** - `freeze` locks the sequence; it can still be run and persisted
//!
//! ## Execution
//! The executor pulls one item at a time from the source layer and folds it
//! through every other layer in order. Items can optionally be spread across
//! rayon workers; a single item's layers always run in sequence.

mod executor;
mod model;

pub use executor::{Executor, ExecutorConfig, FailurePolicy, ItemFailure, RunReport};
pub use model::Pipeline;
