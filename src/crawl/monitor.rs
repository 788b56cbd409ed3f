// src/crawl/monitor.rs
// =============================================================================
// Completion detection by idle sampling.
//
// Nobody ever announces "no more links are coming": links are discovered as a
// side effect of fetching. So this task watches the queue instead:
//
//   WARMUP      wait `warmup` so the seed fetch can get going
//   MONITORING  every `interval`, look at the queue length
//                 len > 0  -> reset the idle counter and the idle timer
//                 len == 0 -> count one idle sample
//   CLOSING     `idle_samples` empty samples in a row, or idle for longer
//               than `idle_ceiling`: close the queue once and stop
//
// This can close the queue while a worker is still fetching a page whose
// links would have been pushed afterwards; those pushes are dropped.
// TerminationMode::Exact avoids that by counting in-flight tasks instead.
// =============================================================================

use std::sync::Arc;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::IdleSettings;
use crate::crawl::queue::TaskQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Warmup,
    Monitoring,
    Closing,
}

#[derive(Debug)]
pub struct CompletionDetector {
    settings: IdleSettings,
    phase: Phase,
    idle_samples: u32,
    last_activity: Instant,
}

impl CompletionDetector {
    pub fn new(settings: IdleSettings) -> Self {
        Self {
            settings,
            phase: Phase::Warmup,
            idle_samples: 0,
            last_activity: Instant::now(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Ends the warmup; idle time is measured from `now`
    pub fn start_monitoring(&mut self, now: Instant) {
        if self.phase == Phase::Warmup {
            self.phase = Phase::Monitoring;
            self.idle_samples = 0;
            self.last_activity = now;
        }
    }

    /// Feeds one sample of the queue length. Returns the phase after it.
    pub fn observe(&mut self, queue_len: usize, now: Instant) -> Phase {
        if self.phase != Phase::Monitoring {
            return self.phase;
        }

        if queue_len > 0 {
            self.idle_samples = 0;
            self.last_activity = now;
            return self.phase;
        }

        self.idle_samples = self.idle_samples.saturating_add(1);
        let idle_for = now.saturating_duration_since(self.last_activity);
        if self.idle_samples >= self.settings.idle_samples || idle_for > self.settings.idle_ceiling
        {
            self.phase = Phase::Closing;
        }
        self.phase
    }

    /// Samples `queue` until it should be closed, then closes it.
    ///
    /// Also returns early, without closing, when `cancel` fires or someone
    /// else closed the queue first.
    pub async fn run(mut self, queue: Arc<TaskQueue>, cancel: CancellationToken) -> Phase {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.phase,
            _ = tokio::time::sleep(self.settings.warmup) => {}
        }

        let started = Instant::now();
        self.start_monitoring(started);
        tracing::debug!(interval = ?self.settings.interval, "completion detector monitoring");

        let mut ticker = interval_at(started + self.settings.interval, self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.phase,
                _ = ticker.tick() => {}
            }

            if queue.is_closed() {
                return self.phase;
            }

            let queue_len = queue.len();
            if self.observe(queue_len, Instant::now()) == Phase::Closing {
                if queue.close() {
                    tracing::info!(
                        idle_samples = self.idle_samples,
                        "no new work appeared, closing the task queue"
                    );
                }
                return Phase::Closing;
            }
            tracing::trace!(queue_len, idle_samples = self.idle_samples, "idle sample");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::queue::Task;
    use std::time::Duration;

    fn settings(idle_samples: u32, ceiling_secs: u64) -> IdleSettings {
        IdleSettings {
            warmup: Duration::from_secs(2),
            interval: Duration::from_secs(1),
            idle_samples,
            idle_ceiling: Duration::from_secs(ceiling_secs),
        }
    }

    #[test]
    fn test_samples_ignored_during_warmup() {
        let mut detector = CompletionDetector::new(settings(1, 30));
        assert_eq!(detector.phase(), Phase::Warmup);
        assert_eq!(detector.observe(0, Instant::now()), Phase::Warmup);

        detector.start_monitoring(Instant::now());
        assert_eq!(detector.phase(), Phase::Monitoring);
    }

    #[test]
    fn test_closes_after_consecutive_idle_samples() {
        let mut detector = CompletionDetector::new(settings(3, 30));
        let t0 = Instant::now();
        detector.start_monitoring(t0);

        assert_eq!(detector.observe(0, t0 + Duration::from_secs(1)), Phase::Monitoring);
        assert_eq!(detector.observe(0, t0 + Duration::from_secs(2)), Phase::Monitoring);
        assert_eq!(detector.observe(0, t0 + Duration::from_secs(3)), Phase::Closing);
    }

    #[test]
    fn test_activity_resets_idle_counter() {
        let mut detector = CompletionDetector::new(settings(3, 30));
        let t0 = Instant::now();
        detector.start_monitoring(t0);

        detector.observe(0, t0 + Duration::from_secs(1));
        detector.observe(0, t0 + Duration::from_secs(2));
        detector.observe(4, t0 + Duration::from_secs(3));
        assert_eq!(detector.observe(0, t0 + Duration::from_secs(4)), Phase::Monitoring);
        assert_eq!(detector.observe(0, t0 + Duration::from_secs(5)), Phase::Monitoring);
        assert_eq!(detector.observe(0, t0 + Duration::from_secs(6)), Phase::Closing);
    }

    #[test]
    fn test_idle_ceiling_fires_first() {
        let mut detector = CompletionDetector::new(settings(100, 3));
        let t0 = Instant::now();
        detector.start_monitoring(t0);

        assert_eq!(detector.observe(0, t0 + Duration::from_secs(3)), Phase::Monitoring);
        assert_eq!(detector.observe(0, t0 + Duration::from_secs(4)), Phase::Closing);
    }

    #[test]
    fn test_closing_is_terminal() {
        let mut detector = CompletionDetector::new(settings(1, 30));
        let t0 = Instant::now();
        detector.start_monitoring(t0);
        assert_eq!(detector.observe(0, t0), Phase::Closing);
        assert_eq!(detector.observe(9, t0), Phase::Closing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_closes_idle_queue_after_warmup_and_samples() {
        let queue = Arc::new(TaskQueue::new(10));
        let started = Instant::now();

        let phase = CompletionDetector::new(settings(5, 30))
            .run(Arc::clone(&queue), CancellationToken::new())
            .await;

        assert_eq!(phase, Phase::Closing);
        assert!(queue.is_closed());
        // 2s warmup + 5 samples one second apart
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_never_closes_busy_queue() {
        let queue = Arc::new(TaskQueue::new(10));
        queue.push(Task::new("http://x.test/", 0)).unwrap();

        let detector = CompletionDetector::new(settings(5, 30));
        let result = tokio::time::timeout(
            Duration::from_secs(120),
            detector.run(Arc::clone(&queue), CancellationToken::new()),
        )
        .await;

        assert!(result.is_err());
        assert!(!queue.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel_without_closing() {
        let queue = Arc::new(TaskQueue::new(10));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let phase = CompletionDetector::new(settings(5, 30))
            .run(Arc::clone(&queue), cancel)
            .await;

        assert_eq!(phase, Phase::Warmup);
        assert!(!queue.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_when_queue_closed_elsewhere() {
        let queue = Arc::new(TaskQueue::new(10));
        queue.push(Task::new("http://x.test/", 0)).unwrap();
        queue.close();

        let phase = CompletionDetector::new(settings(5, 30))
            .run(Arc::clone(&queue), CancellationToken::new())
            .await;

        assert_eq!(phase, Phase::Monitoring);
    }
}
