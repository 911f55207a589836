//! Message pipeline.
//!
//! Each message walks the sequential handlers in registration order. A
//! handler answers [`Flow::Continue`] or [`Flow::Stop`]; stopping ends the
//! walk and nothing else runs for that message. When the walk reaches the
//! end, every parallel handler is queued on the [`TaskPool`] and the
//! pipeline returns without waiting for them.
//!
//! The pipeline holds no lock across messages. Two messages may be in the
//! sequential phase at the same time if the caller dispatches concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use super::TaskPool;
use crate::message::Message;

/// Decision of a sequential handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Where a message is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Next sequential handler to run.
    Running(usize),
    /// Halted by the handler at this index.
    Stopped(usize),
    /// All sequential handlers continued; parallel handlers were queued.
    Completed,
}

/// A stage that runs to completion before the next one starts.
///
/// Handlers deal with their own errors and turn them into a [`Flow`].
#[async_trait]
pub trait SequentialHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, msg: &Arc<Message>) -> Flow;
}

/// A best-effort side effect started after the sequential phase completes.
///
/// Errors are logged by the pipeline and otherwise ignored.
#[async_trait]
pub trait ParallelHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, msg: Arc<Message>) -> anyhow::Result<()>;
}

/// Handler registration. Fixed once [`PipelineBuilder::build`] is called.
#[derive(Default)]
pub struct PipelineBuilder {
    sequential: Vec<Arc<dyn SequentialHandler>>,
    parallel: Vec<Arc<dyn ParallelHandler>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sequential handler; order of calls is execution order.
    #[must_use]
    pub fn sequential(mut self, handler: impl SequentialHandler + 'static) -> Self {
        self.sequential.push(Arc::new(handler));
        self
    }

    /// Add a parallel handler. No ordering between parallel handlers.
    #[must_use]
    pub fn parallel(mut self, handler: impl ParallelHandler + 'static) -> Self {
        self.parallel.push(Arc::new(handler));
        self
    }

    pub fn build(self, tasks: TaskPool) -> Pipeline {
        Pipeline {
            sequential: self.sequential,
            parallel: self.parallel,
            tasks,
        }
    }
}

/// Immutable handler chain plus the pool parallel handlers run on.
pub struct Pipeline {
    sequential: Vec<Arc<dyn SequentialHandler>>,
    parallel: Vec<Arc<dyn ParallelHandler>>,
    tasks: TaskPool,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Names of the sequential handlers, in execution order.
    pub fn sequential_names(&self) -> Vec<&'static str> {
        self.sequential.iter().map(|h| h.name()).collect()
    }

    /// Drive one message through the pipeline.
    ///
    /// Returns `Stopped` or `Completed`; in the latter case parallel
    /// handlers have been queued but may not have run yet.
    pub async fn run(&self, msg: Message) -> PipelineState {
        let msg = Arc::new(msg);
        let mut state = PipelineState::Running(0);

        while let PipelineState::Running(index) = state {
            state = self.step(index, &msg).await;
        }

        if state == PipelineState::Completed {
            self.fan_out(&msg);
        }

        state
    }

    async fn step(&self, index: usize, msg: &Arc<Message>) -> PipelineState {
        let Some(handler) = self.sequential.get(index) else {
            return PipelineState::Completed;
        };

        match handler.handle(msg).await {
            Flow::Continue => PipelineState::Running(index + 1),
            Flow::Stop => {
                debug!(
                    handler = handler.name(),
                    position = index + 1,
                    message_id = %msg.id,
                    "Pipeline stopped"
                );
                PipelineState::Stopped(index)
            }
        }
    }

    fn fan_out(&self, msg: &Arc<Message>) {
        for (index, handler) in self.parallel.iter().enumerate() {
            let handler = Arc::clone(handler);
            let msg = Arc::clone(msg);

            self.tasks.submit(handler.name(), async move {
                if let Err(e) = handler.handle(Arc::clone(&msg)).await {
                    error!(
                        handler = handler.name(),
                        position = index + 1,
                        message_id = %msg.id,
                        "Parallel handler failed: {:#}",
                        e
                    );
                }
            });
        }
    }
}
