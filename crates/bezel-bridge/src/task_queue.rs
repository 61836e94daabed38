//! Closures scheduled onto the render thread.
//!
//! The counterpart of [`bezel_transfer::UiScheduler`]: any thread enqueues,
//! the render thread drains once per tick at the top of its update. The
//! mutex is held only for the batch swap, so the frame path never blocks on
//! task producers.

use std::sync::Mutex;

use bezel_transfer::UiTask;

/// Schedules one-shot closures onto the render thread.
pub trait RenderScheduler: Send + Sync {
    fn run_on_render(&self, task: UiTask);
}

/// The default `RenderScheduler`: a drained-per-tick task queue.
#[derive(Default)]
pub struct RenderTaskQueue {
    tasks: Mutex<Vec<UiTask>>,
}

impl RenderTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, task: impl FnOnce() + Send + 'static) {
        self.tasks.lock().unwrap().push(Box::new(task));
    }

    /// Run every queued task, in enqueue order. Render thread only; returns
    /// how many tasks ran.
    pub fn drain(&self) -> usize {
        let batch: Vec<UiTask> = std::mem::take(&mut *self.tasks.lock().unwrap());
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }
}

impl RenderScheduler for RenderTaskQueue {
    fn run_on_render(&self, task: UiTask) {
        self.tasks.lock().unwrap().push(task);
    }
}
