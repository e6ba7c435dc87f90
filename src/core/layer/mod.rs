//! # Layer Module
//!
//! The contract every pipeline stage satisfies.
//!
//! A layer has a stable identity (name and type tag), declares which layer
//! types may directly precede it, and turns a batch of images into a new
//! batch. Source layers additionally originate batches from storage.
//!
//! ## Writing a custom layer
//! ```rust,ignore
//! struct Invert { info: LayerInfo }
//!
//! impl Layer for Invert {
//!     fn info(&self) -> &LayerInfo { &self.info }
//!
//!     fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
//!         Ok(images.iter().map(|image| { let mut out = image.clone(); out.invert(); out }).collect())
//!     }
//! }
//!
//! let info = LayerInfo::new("invert", STANDARD_PARENTS, "-")?;
//! pipeline.add(Invert { info })?;
//! ```

mod info;
mod template;

pub use info::{default_name, kinds, LayerInfo, STANDARD_PARENTS};
pub use template::Augmentation;
pub(crate) use template::{augment, map_each};

use crate::core::snapshot::LayerSpec;
use crate::error::ExecutionError;
use image::DynamicImage;

/// The images flowing between two layers for one source item
pub type ImageBatch = Vec<DynamicImage>;

/// A single pipeline stage
pub trait Layer: Send + Sync {
    /// Identity and adjacency contract
    fn info(&self) -> &LayerInfo;

    /// Produce a new batch from `images`.
    ///
    /// `context` identifies the source item (usually its file name). Only
    /// sink layers use it, to name their output files. Degenerate images are
    /// dropped rather than propagated.
    fn transform(&self, images: &[DynamicImage], context: &str)
        -> Result<ImageBatch, ExecutionError>;

    /// Entry point of source layers
    fn as_source(&self) -> Option<&dyn SourceLayer> {
        None
    }

    /// Serializable description, `None` for layers that cannot be persisted
    fn to_spec(&self) -> Option<LayerSpec> {
        None
    }

    fn get_type(&self) -> &str {
        self.info().kind()
    }

    fn get_name(&self) -> &str {
        self.info().name()
    }

    fn is_valid_predecessor(&self, previous_type: &str) -> bool {
        self.info().accepts(previous_type)
    }

    /// `("<name>(<type>)", "<parameters>")` for reporting
    fn describe(&self) -> (String, String) {
        let info = self.info();
        (
            format!("{}({})", info.name(), info.kind()),
            info.description().to_string(),
        )
    }

    /// Source layers accept no parent type at all
    fn is_source(&self) -> bool {
        self.info().supported_parents().is_empty()
    }
}

/// Layers that originate batches instead of transforming them
pub trait SourceLayer {
    /// List every item and return a lazy loader over them
    fn open(&self) -> Result<SourceListing, ExecutionError>;
}

/// One decoded item from a source layer
pub struct SourceItem {
    /// Identifier handed to every layer as `context`
    pub identifier: String,
    /// The initial batch, or why it could not be produced
    pub batch: Result<ImageBatch, ExecutionError>,
}

/// Single-pass, non-restartable stream of items
pub type SourceItems = Box<dyn Iterator<Item = SourceItem> + Send>;

/// What a source layer hands to the executor
pub struct SourceListing {
    /// Every item the stream will produce, in order
    pub identifiers: Vec<String>,
    pub items: SourceItems,
}

/// Zero-area images are never passed on
pub fn is_degenerate(image: &DynamicImage) -> bool {
    image.width() == 0 || image.height() == 0
}
