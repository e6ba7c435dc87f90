//! # imagepipe
//!
//! Declarative pipelines for batch image preprocessing and augmentation.
//!
//! ## Core Idea
//! - **Compose** - stack named layers; each one declares which layer types may precede it
//! - **Validate early** - bad arguments and bad neighbours are rejected when the pipeline is built
//! - **Run lazily** - one source item at a time is decoded, transformed and written
//!
//! ## Architecture
//! - `core` - Layers, pixel operations, the pipeline and its executor
//! - `events` - Event-driven progress reporting
//! - `error` - Error taxonomy
//! - `cli` - Command-line interface (binary only)
//!
//! ## Example
//! ```rust,no_run
//! use imagepipe::core::layers::{Augmentation, Interpolation, RandomFlip, Read, Resize, Save, SaveFormat};
//! use imagepipe::core::Pipeline;
//!
//! # fn main() -> imagepipe::Result<()> {
//! let mut pipeline = Pipeline::new();
//! pipeline.add(Read::new("images")?)?;
//! pipeline.add(Resize::new((224, 224), Interpolation::Area)?)?;
//! pipeline.add(RandomFlip::new(Augmentation::new(0.5, 3)?))?;
//! pipeline.add(Save::new("augmented", SaveFormat::Img)?)?;
//! pipeline.freeze();
//!
//! let report = pipeline.transform()?;
//! println!("{} images written", report.images_out);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{PipelineError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. Filters come from
/// `RUST_LOG`. Calling it twice is harmless.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
