//! Stage and output seams.
//!
//! Per stage, handlers resolve in priority order: a registered processor
//! object, then a registered handler function, then the default
//! pass-through. Specialized pipelines override a subset of stages and
//! inherit the rest.

use std::sync::Arc;

use crate::item::PipelineItem;

/// What a stage did with the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    /// The item continues to the next stage.
    Continue,
    /// The stage consumed the item (e.g. into a merge buffer); nothing
    /// further runs for it.
    Consume,
}

/// A stateful stage override.
pub trait StageProcessor: Send + Sync {
    fn process(&self, stage: &str, item: &mut PipelineItem) -> Result<StageAction, String>;
}

/// A stateless stage override.
pub type StageHandlerFn =
    Arc<dyn Fn(&mut PipelineItem) -> Result<StageAction, String> + Send + Sync>;

/// Receives every completed item. One handler's failure never blocks
/// delivery to the others.
pub trait OutputHandler: Send + Sync {
    fn on_item(&self, item: &PipelineItem) -> Result<(), String>;
}

/// The default stage behavior: pass the item through untouched. Stage
/// completion is recorded by the worker, so this is a true no-op.
#[derive(Debug, Default)]
pub struct PassThroughProcessor;

impl StageProcessor for PassThroughProcessor {
    fn process(&self, _stage: &str, _item: &mut PipelineItem) -> Result<StageAction, String> {
        Ok(StageAction::Continue)
    }
}
