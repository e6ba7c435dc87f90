//! # Core Module
//!
//! The pipeline engine.
//!
//! ## Modules
//! - `layer` - The contract every stage implements
//! - `layers` - Built-in sources, sinks, preprocessing and augmentation
//! - `gate` - Probability gate of the random layers
//! - `ops` - Pixel operations behind the built-in layers
//! - `decode` - Image decoding for the read layer
//! - `pipeline` - Composition rules and the executor
//! - `snapshot` - Persisted pipeline format
//! - `reporter` - Summary tables

pub mod decode;
pub mod gate;
pub mod layer;
pub mod layers;
pub mod ops;
pub mod pipeline;
pub mod reporter;
pub mod snapshot;

// Re-export commonly used types
pub use gate::ProbabilityGate;
pub use layer::{ImageBatch, Layer, LayerInfo, SourceLayer};
pub use pipeline::{Executor, ExecutorConfig, FailurePolicy, Pipeline, RunReport};
pub use reporter::SummaryRow;
pub use snapshot::{LayerSpec, PipelineSnapshot};
