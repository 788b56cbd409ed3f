// src/crawl/queue.rs
// =============================================================================
// The bounded task queue shared by all workers.
//
// How it works:
// 1. `push` never waits. A full or closed queue rejects the task and the
//    caller logs the drop.
// 2. `pop` waits until a task is buffered, or until the queue is closed
//    and empty, in which case it returns None and the worker exits.
// 3. `close` flips OPEN -> CLOSED exactly once and wakes every waiting worker.
//
// The queue also counts tasks that were popped but not yet finished
// ("in flight"). Exact termination uses that counter: once the buffer is
// empty and nothing is in flight, no more work can ever arrive.
//
// Rust concepts:
// - Mutex: every operation is one critical section, no check-then-act races
// - Notify: lets async workers sleep until a push or close happens
// - VecDeque: FIFO buffer
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::error::PushError;

// Default number of buffered tasks
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

// One unit of crawl work: a URL and how many link hops it is from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub url: String,
    pub depth: usize,
}

impl Task {
    pub fn new(url: impl Into<String>, depth: usize) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    closed: bool,
    in_flight: usize,
    dropped: usize,
}

#[derive(Debug)]
pub struct TaskQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    available: Notify,
}

impl TaskQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(QueueState {
                tasks: VecDeque::with_capacity(capacity.min(DEFAULT_QUEUE_CAPACITY)),
                ..QueueState::default()
            }),
            available: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Non-blocking enqueue.
    ///
    /// Rejected tasks are counted in `dropped()`.
    pub fn push(&self, task: Task) -> Result<(), PushError> {
        {
            let mut state = self.lock();
            if state.closed {
                state.dropped += 1;
                return Err(PushError::Closed);
            }
            if state.tasks.len() >= self.capacity {
                state.dropped += 1;
                return Err(PushError::Full {
                    capacity: self.capacity,
                });
            }
            state.tasks.push_back(task);
        }

        self.available.notify_one();
        Ok(())
    }

    /// Waits for the next task. None means the queue is closed and drained.
    ///
    /// A returned task counts as in flight until `finish_task` is called.
    pub async fn pop(&self) -> Option<Task> {
        loop {
            // Register interest before looking at the state, otherwise a
            // push or close between the check and the await would be missed.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(task) = state.tasks.pop_front() {
                    state.in_flight += 1;
                    let more_waiting = !state.tasks.is_empty();
                    drop(state);

                    // notify_one permits can be consumed by a single waiter
                    // while several tasks are buffered, so pass it along
                    if more_waiting {
                        self.available.notify_one();
                    }
                    return Some(task);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks one popped task as fully processed (fetched, links pushed).
    ///
    /// Returns true when the buffer is empty and no task is in flight.
    pub fn finish_task(&self) -> bool {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.tasks.is_empty() && state.in_flight == 0
    }

    /// Closes the queue. Returns true only for the call that performed the transition.
    pub fn close(&self) -> bool {
        {
            let mut state = self.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
        }

        self.available.notify_waiters();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Number of tasks rejected so far (full or closed)
    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why std::sync::Mutex and not tokio::sync::Mutex?
//    - The lock is never held across an .await
//    - std's Mutex is cheaper for short critical sections like these
//
// 2. Why does pop() call enable() on the Notified future?
//    - notify_waiters() only wakes futures that are already registered
//    - enable() registers it before we inspect the buffer, so a close()
//      that lands in between still wakes us up
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_capacity_is_enforced() {
        let queue = TaskQueue::new(2);
        assert_eq!(queue.capacity(), 2);
        assert!(queue.push(Task::new("http://x.test/1", 0)).is_ok());
        assert!(queue.push(Task::new("http://x.test/2", 0)).is_ok());
        assert_eq!(
            queue.push(Task::new("http://x.test/3", 0)),
            Err(PushError::Full { capacity: 2 })
        );
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);
    }

    #[test]
    fn test_concurrent_pushes_respect_capacity() {
        let queue = Arc::new(TaskQueue::new(2));
        let barrier = Arc::new(std::sync::Barrier::new(3));

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let queue = Arc::clone(&queue);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    queue.push(Task::new(format!("http://x.test/{i}"), 0)).is_ok()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, 2);
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_pop_is_fifo() {
        let queue = TaskQueue::new(10);
        queue.push(Task::new("http://x.test/a", 0)).unwrap();
        queue.push(Task::new("http://x.test/b", 1)).unwrap();

        assert_eq!(queue.pop().await, Some(Task::new("http://x.test/a", 0)));
        assert_eq!(queue.pop().await, Some(Task::new("http://x.test/b", 1)));
        assert_eq!(queue.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_close_drains_remaining_tasks() {
        let queue = TaskQueue::new(10);
        queue.push(Task::new("http://x.test/a", 0)).unwrap();
        assert!(queue.close());

        assert_eq!(queue.pop().await, Some(Task::new("http://x.test/a", 0)));
        assert_eq!(queue.pop().await, None);
    }

    #[tokio::test]
    async fn test_push_after_close_fails() {
        let queue = TaskQueue::new(10);
        queue.close();
        assert_eq!(
            queue.push(Task::new("http://x.test/a", 0)),
            Err(PushError::Closed)
        );
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_under_concurrency() {
        let queue = Arc::new(TaskQueue::new(10));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.close() })
            })
            .collect();

        let mut transitions = 0;
        for handle in handles {
            if handle.await.unwrap() {
                transitions += 1;
            }
        }

        assert_eq!(transitions, 1);
        assert!(queue.is_closed());
        assert!(queue.push(Task::new("http://x.test/late", 0)).is_err());
    }

    #[tokio::test]
    async fn test_close_releases_blocked_workers() {
        let queue = Arc::new(TaskQueue::new(10));

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.pop().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        for waiter in waiters {
            let popped = tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(popped, None);
        }
    }

    #[tokio::test]
    async fn test_push_wakes_blocked_worker() {
        let queue = Arc::new(TaskQueue::new(10));

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(Task::new("http://x.test/a", 3)).unwrap();

        let popped = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(popped, Some(Task::new("http://x.test/a", 3)));
    }

    #[tokio::test]
    async fn test_finish_task_reports_drained_state() {
        let queue = TaskQueue::new(10);
        queue.push(Task::new("http://x.test/", 0)).unwrap();

        let _seed = queue.pop().await.unwrap();
        queue.push(Task::new("http://x.test/a", 1)).unwrap();
        assert!(!queue.finish_task());

        let _child = queue.pop().await.unwrap();
        assert!(queue.finish_task());
        assert_eq!(queue.in_flight(), 0);
    }
}
