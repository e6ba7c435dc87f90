//! Pipeline execution implementation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::model::Pipeline;
use crate::core::layer::{ImageBatch, Layer, SourceItem};
use crate::error::ExecutionError;
use crate::events::{null_sender, Event, EventSender, ItemProgress, RunEvent, RunSummary};

/// What to do when one source item fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and return the error
    #[default]
    Abort,
    /// Record the failure and move on to the next item
    Skip,
}

/// Configuration for the executor
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Process several source items at once
    pub parallel: bool,
    /// Per-item failure handling
    pub on_failure: FailurePolicy,
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }
}

/// A source item that did not make it through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub identifier: String,
    pub message: String,
}

/// Result of a pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Items the source listed
    pub total_items: usize,
    /// Items that went through every layer
    pub processed_items: usize,
    /// Images left after the last layer, summed over items
    pub images_out: usize,
    /// Items skipped under [`FailurePolicy::Skip`]
    pub failures: Vec<ItemFailure>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Runs a pipeline's source through the remaining layers, one item at a time
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self, pipeline: &Pipeline) -> Result<RunReport, ExecutionError> {
        self.run_with_events(pipeline, &null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(
        &self,
        pipeline: &Pipeline,
        events: &EventSender,
    ) -> Result<RunReport, ExecutionError> {
        let start_time = Instant::now();

        let (first, rest) = pipeline
            .layers()
            .split_first()
            .ok_or(ExecutionError::EmptyPipeline)?;
        let source = first.as_source().ok_or_else(|| ExecutionError::NotASource {
            kind: first.get_type().to_string(),
        })?;

        let listing = source.open()?;
        let total_items = listing.identifiers.len();
        let mut items = listing.items;

        info!(
            source = %first.get_name(),
            layers = pipeline.len(),
            items = total_items,
            parallel = self.config.parallel,
            "Pipeline run started"
        );
        events.send(Event::Run(RunEvent::Started { total_items }));

        let run = RunState {
            layers: rest,
            policy: self.config.on_failure,
            total_items,
            events,
            handled: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
            images_out: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
        };

        let outcome = if self.config.parallel {
            items.par_bridge().try_for_each(|item| run.process(item))
        } else {
            items.try_for_each(|item| run.process(item))
        };

        if let Err(error) = outcome {
            warn!(error = %error, "Pipeline run aborted");
            events.send(Event::Run(RunEvent::Aborted {
                message: error.to_string(),
            }));
            return Err(error);
        }

        let failures = run.failures.into_inner().unwrap_or_else(|e| e.into_inner());
        let processed_items = run.processed.load(Ordering::SeqCst);
        let images_out = run.images_out.load(Ordering::SeqCst);
        let duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            processed = processed_items,
            failed = failures.len(),
            images_out,
            duration_ms,
            "Pipeline run completed"
        );
        events.send(Event::Run(RunEvent::Completed {
            summary: RunSummary {
                total_items,
                processed_items,
                failed_items: failures.len(),
                images_out,
                duration_ms,
            },
        }));

        Ok(RunReport {
            total_items,
            processed_items,
            images_out,
            failures,
            duration_ms,
        })
    }
}

/// Shared by every worker during one run
struct RunState<'a> {
    layers: &'a [Box<dyn Layer>],
    policy: FailurePolicy,
    total_items: usize,
    events: &'a EventSender,
    /// Items finished either way, drives progress
    handled: AtomicUsize,
    /// Items that made it through every layer
    processed: AtomicUsize,
    images_out: AtomicUsize,
    failures: Mutex<Vec<ItemFailure>>,
}

impl RunState<'_> {
    fn process(&self, item: SourceItem) -> Result<(), ExecutionError> {
        let SourceItem { identifier, batch } = item;

        let outcome = batch.and_then(|batch| self.fold(batch, &identifier));
        let completed = self.handled.fetch_add(1, Ordering::SeqCst) + 1;

        match outcome {
            Ok(batch) => {
                self.processed.fetch_add(1, Ordering::SeqCst);
                self.images_out.fetch_add(batch.len(), Ordering::SeqCst);

                debug!(item = %identifier, images = batch.len(), "Item processed");
                self.events.send(Event::Run(RunEvent::ItemCompleted(ItemProgress {
                    identifier,
                    completed,
                    total: self.total_items,
                    images_out: batch.len(),
                })));
                Ok(())
            }
            Err(error) => {
                self.events.send(Event::Run(RunEvent::ItemFailed {
                    identifier: identifier.clone(),
                    message: error.to_string(),
                    completed,
                }));

                match self.policy {
                    FailurePolicy::Abort => Err(error),
                    FailurePolicy::Skip => {
                        warn!(item = %identifier, error = %error, "Skipping item");
                        let failure = ItemFailure {
                            identifier,
                            message: error.to_string(),
                        };
                        self.failures
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .push(failure);
                        Ok(())
                    }
                }
            }
        }
    }

    /// Feed `batch` through every non-source layer in order
    fn fold(&self, batch: ImageBatch, identifier: &str) -> Result<ImageBatch, ExecutionError> {
        self.layers
            .iter()
            .try_fold(batch, |batch, layer| layer.transform(&batch, identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layer::{LayerInfo, STANDARD_PARENTS};
    use crate::core::layers::{Augmentation, Interpolation, RandomHorizontalFlip, Read, Resize};
    use crate::events::EventChannel;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_images(dir: &Path, names: &[&str]) {
        for name in names {
            RgbImage::from_pixel(20, 10, Rgb([50, 100, 150]))
                .save(dir.join(name))
                .unwrap();
        }
    }

    /// Fails every item whose identifier starts with "bad"
    struct Picky {
        info: LayerInfo,
    }

    impl Picky {
        fn new() -> Self {
            Self {
                info: LayerInfo::new("picky", STANDARD_PARENTS, "-").unwrap(),
            }
        }
    }

    impl Layer for Picky {
        fn info(&self) -> &LayerInfo {
            &self.info
        }

        fn transform(&self, images: &[DynamicImage], context: &str) -> Result<ImageBatch, ExecutionError> {
            if context.starts_with("bad") {
                return Err(ExecutionError::Decode {
                    path: context.into(),
                    reason: "rejected".to_string(),
                });
            }
            Ok(images.to_vec())
        }
    }

    /// A source-shaped layer that never exposes `as_source`
    struct Orphan {
        info: LayerInfo,
    }

    impl Layer for Orphan {
        fn info(&self) -> &LayerInfo {
            &self.info
        }

        fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
            Ok(images.to_vec())
        }
    }

    fn pipeline(dir: &Path) -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline.add(Read::new(dir).unwrap()).unwrap();
        pipeline.add(Picky::new()).unwrap();
        pipeline
            .add(RandomHorizontalFlip::new(Augmentation::new(1.0, 2).unwrap()))
            .unwrap();
        pipeline
    }

    #[test]
    fn empty_pipeline_is_an_error() {
        let result = Executor::default().run(&Pipeline::new());
        assert!(matches!(result, Err(ExecutionError::EmptyPipeline)));
    }

    #[test]
    fn first_layer_must_expose_a_source() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add(Orphan {
                info: LayerInfo::new("orphan", &[], "-").unwrap(),
            })
            .unwrap();

        let result = Executor::default().run(&pipeline);
        assert!(matches!(result, Err(ExecutionError::NotASource { ref kind }) if kind == "orphan"));
    }

    #[test]
    fn fan_out_is_counted_per_item() {
        let dir = TempDir::new().unwrap();
        write_images(dir.path(), &["a.png", "b.png", "c.png"]);

        let report = Executor::default().run(&pipeline(dir.path())).unwrap();

        assert_eq!(report.total_items, 3);
        assert_eq!(report.processed_items, 3);
        assert_eq!(report.images_out, 6);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn abort_policy_returns_first_error() {
        let dir = TempDir::new().unwrap();
        write_images(dir.path(), &["a.png", "bad.png", "c.png"]);

        let result = Executor::default().run(&pipeline(dir.path()));
        assert!(matches!(result, Err(ExecutionError::Decode { .. })));
    }

    #[test]
    fn skip_policy_records_failures_and_continues() {
        let dir = TempDir::new().unwrap();
        write_images(dir.path(), &["a.png", "bad.png", "c.png"]);

        let executor = Executor::new(ExecutorConfig::new().on_failure(FailurePolicy::Skip));
        let report = executor.run(&pipeline(dir.path())).unwrap();

        assert_eq!(report.processed_items, 2);
        assert_eq!(report.images_out, 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].identifier, "bad.png");
    }

    #[test]
    fn parallel_run_matches_sequential_counts() {
        let dir = TempDir::new().unwrap();
        write_images(dir.path(), &["a.png", "b.png", "c.png", "d.png", "e.png"]);

        let mut pipeline = Pipeline::new();
        pipeline.add(Read::new(dir.path()).unwrap()).unwrap();
        pipeline
            .add(Resize::new((8, 8), Interpolation::Area).unwrap())
            .unwrap();

        let executor = Executor::new(ExecutorConfig::new().parallel(true));
        let report = executor.run(&pipeline).unwrap();

        assert_eq!(report.processed_items, 5);
        assert_eq!(report.images_out, 5);
    }

    #[test]
    fn events_bracket_the_run() {
        let dir = TempDir::new().unwrap();
        write_images(dir.path(), &["a.png", "b.png"]);

        let (sender, receiver) = EventChannel::new();
        Executor::default()
            .run_with_events(&pipeline(dir.path()), &sender)
            .unwrap();
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        assert!(matches!(events.first(), Some(Event::Run(RunEvent::Started { total_items: 2 }))));
        assert!(matches!(events.last(), Some(Event::Run(RunEvent::Completed { .. }))));
        let completed = events
            .iter()
            .filter(|e| matches!(e, Event::Run(RunEvent::ItemCompleted(_))))
            .count();
        assert_eq!(completed, 2);
    }

    #[test]
    fn skipped_items_advance_progress() {
        let dir = TempDir::new().unwrap();
        write_images(dir.path(), &["bad1.png", "bad2.png", "c.png"]);

        let (sender, receiver) = EventChannel::new();
        let executor = Executor::new(ExecutorConfig::new().on_failure(FailurePolicy::Skip));
        let report = executor
            .run_with_events(&pipeline(dir.path()), &sender)
            .unwrap();
        drop(sender);

        let progress: Vec<usize> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Run(RunEvent::ItemCompleted(p)) => Some(p.completed),
                Event::Run(RunEvent::ItemFailed { completed, .. }) => Some(completed),
                _ => None,
            })
            .collect();

        assert_eq!(progress, vec![1, 2, 3]);
        assert_eq!(report.processed_items, 1);
        assert_eq!(report.failures.len(), 2);
    }
}
