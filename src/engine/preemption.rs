// src/engine/preemption.rs

use tokio::sync::watch;

use crate::engine::Generation;

/// Lets a run observe whether a newer generation has been started.
///
/// The runner publishes its current generation on a `watch` channel; a run
/// tagged with generation `g` is preempted as soon as the published value
/// exceeds `g`. Comparing against a monotonic counter orders a late
/// completion and a new trigger without any locking on the caller's side.
#[derive(Debug, Clone)]
pub struct Preemption {
    generation: Generation,
    current: watch::Receiver<Generation>,
}

impl Preemption {
    pub fn new(generation: Generation, current: watch::Receiver<Generation>) -> Self {
        Self {
            generation,
            current,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_preempted(&self) -> bool {
        *self.current.borrow() > self.generation
    }

    /// Resolve once a newer generation is published.
    ///
    /// Also resolves when the runner is gone, so orphaned commands are
    /// stopped rather than left running.
    pub async fn preempted(&mut self) {
        let generation = self.generation;
        let _ = self.current.wait_for(|current| *current > generation).await;
    }
}
