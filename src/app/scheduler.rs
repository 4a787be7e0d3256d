use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crate::app::models::BackendKind;

pub struct GlobalSemaphore {
    limit: usize,
    used: Mutex<usize>,
    cv: Condvar,
}

impl GlobalSemaphore {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            used: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    pub fn acquire(self: &Arc<Self>) -> GlobalPermit {
        let mut used = self.used.lock().unwrap_or_else(PoisonError::into_inner);
        while *used >= self.limit {
            used = self.cv.wait(used).unwrap_or_else(PoisonError::into_inner);
        }
        *used += 1;
        GlobalPermit {
            semaphore: Arc::clone(self),
        }
    }

    fn release(&self) {
        let mut used = self.used.lock().unwrap_or_else(PoisonError::into_inner);
        *used = used.saturating_sub(1);
        self.cv.notify_one();
    }
}

pub struct GlobalPermit {
    semaphore: Arc<GlobalSemaphore>,
}

impl Drop for GlobalPermit {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

/// Worker threads for blocking backend calls, plus one lock per backend so a
/// backend's session is never driven by two callers at once.
pub struct TaskScheduler {
    global: Arc<GlobalSemaphore>,
    backend_locks: Mutex<HashMap<BackendKind, Arc<Mutex<()>>>>,
}

impl TaskScheduler {
    pub fn new(global_limit: usize) -> Self {
        Self {
            global: Arc::new(GlobalSemaphore::new(global_limit)),
            backend_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend_lock(&self, kind: BackendKind) -> Arc<Mutex<()>> {
        let mut guard = self
            .backend_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .entry(kind)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs `task` on a new thread once a global permit is free.
    pub fn spawn<T, F>(&self, task: F) -> JoinHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let global = Arc::clone(&self.global);
        std::thread::spawn(move || {
            let _permit = global.acquire();
            task()
        })
    }
}

/// A panicking holder must not wedge the backend for everyone else.
pub fn lock_ignoring_poison(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn spawned_tasks_respect_global_limit() {
        let scheduler = Arc::new(TaskScheduler::new(2));

        let running = Arc::new(AtomicUsize::new(0));
        let max_running = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let running = Arc::clone(&running);
            let max_running = Arc::clone(&max_running);
            handles.push(scheduler.spawn(move || {
                let current = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_running.fetch_max(current, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(30));
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.join().expect("join");
        }

        assert!(max_running.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn backend_lock_serializes_same_backend() {
        let scheduler = Arc::new(TaskScheduler::new(8));

        let running = Arc::new(AtomicUsize::new(0));
        let max_running = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let lock = scheduler.backend_lock(BackendKind::ElevatedSession);
            let running = Arc::clone(&running);
            let max_running = Arc::clone(&max_running);
            handles.push(scheduler.spawn(move || {
                let _guard = lock_ignoring_poison(&lock);
                let current = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_running.fetch_max(current, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.join().expect("join");
        }

        assert_eq!(max_running.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_backends_get_distinct_locks() {
        let scheduler = TaskScheduler::new(1);
        let broker = scheduler.backend_lock(BackendKind::DelegatedBroker);
        let elevated = scheduler.backend_lock(BackendKind::ElevatedSession);
        assert!(!Arc::ptr_eq(&broker, &elevated));
        assert!(Arc::ptr_eq(
            &broker,
            &scheduler.backend_lock(BackendKind::DelegatedBroker)
        ));
    }
}
