//! Postponed task queue.
//!
//! Work that must see a fully-constructed descriptor graph (assigning an
//! annotation's type, for one) is queued here while the triggering
//! resolution is still on the stack, and run in order once it returns.

use std::fmt;

use descry_descriptors::Descriptors;

/// A deferred completion step. Tasks cannot enqueue further tasks.
pub type PostponedTask = Box<dyn FnOnce(&mut Descriptors) + Send>;

#[derive(Default)]
pub struct PostponedTasks {
    tasks: Vec<PostponedTask>,
}

impl PostponedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: impl FnOnce(&mut Descriptors) + Send + 'static) {
        self.tasks.push(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop tasks queued after the first `len`, for a pass that failed.
    pub fn truncate(&mut self, len: usize) {
        self.tasks.truncate(len);
    }

    /// Run every task in FIFO order.
    pub fn perform(self, descriptors: &mut Descriptors) {
        if self.tasks.is_empty() {
            return;
        }
        tracing::trace!(count = self.tasks.len(), "performing postponed tasks");
        for task in self.tasks {
            task(descriptors);
        }
    }
}

impl fmt::Debug for PostponedTasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostponedTasks")
            .field("len", &self.tasks.len())
            .finish()
    }
}
