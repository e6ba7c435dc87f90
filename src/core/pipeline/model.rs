//! The ordered, validated layer sequence.

use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::executor::{Executor, RunReport};
use crate::core::layer::Layer;
use crate::core::reporter::{render_table, SummaryRow};
use crate::core::snapshot::{PipelineSnapshot, SNAPSHOT_VERSION};
use crate::error::{CompositionError, ExecutionError, SnapshotError};

/// Layers in execution order plus the building/frozen lifecycle flag.
///
/// Every accepted layer was a valid successor of the one before it, and
/// the first is a source. Freezing is irreversible.
#[derive(Default)]
pub struct Pipeline {
    layers: Vec<Box<dyn Layer>>,
    frozen: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `layer`, enforcing the adjacency rules.
    pub fn add(&mut self, layer: impl Layer + 'static) -> Result<(), CompositionError> {
        self.add_boxed(Box::new(layer))
    }

    /// [`add`](Self::add) for layers that are already boxed
    pub fn add_boxed(&mut self, layer: Box<dyn Layer>) -> Result<(), CompositionError> {
        let kind = layer.get_type().to_string();

        if self.frozen {
            return Err(CompositionError::Frozen { kind });
        }

        match self.layers.last() {
            None if !layer.is_source() => {
                return Err(CompositionError::FirstLayerNotSource { kind });
            }
            Some(previous) if !layer.is_valid_predecessor(previous.get_type()) => {
                return Err(CompositionError::UnsupportedParent {
                    kind,
                    parent: previous.get_type().to_string(),
                });
            }
            _ => {}
        }

        debug!(layer = %layer.get_name(), kind = %kind, position = self.layers.len(), "Layer added");
        self.layers.push(layer);
        Ok(())
    }

    /// Stop accepting layers. Calling it again has no effect.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    /// One row per layer, numbered from 1
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.layers
            .iter()
            .enumerate()
            .map(|(i, layer)| {
                let (name, parameters) = layer.describe();
                SummaryRow {
                    index: i + 1,
                    name,
                    parameters,
                }
            })
            .collect()
    }

    /// The summary as an Index/Name/Parameters text table
    pub fn summary_table(&self) -> String {
        render_table(&self.summary())
    }

    /// Run over every source item with default settings
    pub fn transform(&self) -> Result<RunReport, ExecutionError> {
        Executor::default().run(self)
    }

    /// Snapshot of the current state. Fails on layers without a persisted form.
    pub fn to_snapshot(&self) -> Result<PipelineSnapshot, SnapshotError> {
        let layers = self
            .layers
            .iter()
            .map(|layer| {
                layer.to_spec().ok_or_else(|| SnapshotError::NotSerializable {
                    name: layer.get_name().to_string(),
                    kind: layer.get_type().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PipelineSnapshot {
            format_version: SNAPSHOT_VERSION,
            frozen: self.frozen,
            layers,
        })
    }

    /// Rebuild a pipeline from a snapshot, re-validating every layer.
    ///
    /// Layers are rebuilt through their constructors but appended without
    /// adjacency checks, exactly as they were persisted.
    pub fn from_snapshot(snapshot: PipelineSnapshot) -> Result<Self, SnapshotError> {
        snapshot.check_version()?;

        let layers = snapshot
            .layers
            .into_iter()
            .map(|spec| spec.build())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            layers,
            frozen: snapshot.frozen,
        })
    }

    /// Write the pipeline to `path` as JSON
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.to_snapshot()?)?;

        fs::write(path, json).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), layers = self.layers.len(), "Pipeline persisted");
        Ok(())
    }

    /// Replace this pipeline's layers and frozen flag with the contents of `path`.
    ///
    /// Nothing changes unless the whole file loads.
    pub fn restore(&mut self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        *self = Self::load(path)?;
        Ok(())
    }

    /// Read a persisted pipeline from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let snapshot: PipelineSnapshot = serde_json::from_str(&json)?;
        let pipeline = Self::from_snapshot(snapshot)?;

        debug!(path = %path.display(), layers = pipeline.len(), "Pipeline restored");
        Ok(pipeline)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("layers", &self.summary())
            .field("frozen", &self.frozen)
            .finish()
    }
}
