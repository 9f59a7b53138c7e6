use std::future::Future;

/// Runs the board's local (non-`Send`) futures: pending restores and shares.
///
/// On native the futures live in a [`futures::executor::LocalPool`] that the
/// app polls once per frame. On the web they are handed to the browser's
/// microtask queue.
#[derive(Default)]
pub struct TaskRunner {
    #[cfg(not(target_arch = "wasm32"))]
    pool: futures::executor::LocalPool,
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner").finish_non_exhaustive()
    }
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        use futures::task::LocalSpawnExt;

        if let Err(err) = self.pool.spawner().spawn_local(task) {
            log::error!("Failed to schedule task: {}", err);
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        wasm_bindgen_futures::spawn_local(task);
    }

    /// Drive every spawned task as far as it can go without blocking
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run_pending(&mut self) {
        self.pool.run_until_stalled();
    }

    #[cfg(target_arch = "wasm32")]
    pub fn run_pending(&mut self) {}
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_tasks_run_when_polled() {
        let mut runner = TaskRunner::new();
        let done = Rc::new(Cell::new(false));
        let (sender, receiver) = oneshot::channel::<()>();

        let flag = Rc::clone(&done);
        runner.spawn(async move {
            let _ = receiver.await;
            flag.set(true);
        });

        runner.run_pending();
        assert!(!done.get());

        sender.send(()).unwrap();
        runner.run_pending();
        assert!(done.get());
    }
}
