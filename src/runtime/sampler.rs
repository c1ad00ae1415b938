use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::domain::{RunId, RunSample};
use crate::repository::SampleRepository;

use super::RunRegistry;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Registration of one run with the sampler.
#[derive(Debug, Default)]
struct SamplingTask {
    primed: AtomicBool,
    cancelled: AtomicBool,
    last_at_micros: AtomicI64,
}

impl SamplingTask {
    fn is_live(&self) -> bool {
        self.primed.load(Ordering::Acquire) && !self.cancelled.load(Ordering::Acquire)
    }

    /// Strictly increasing sample time even if the wall clock steps back.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let now_micros = now.timestamp_micros();
        let previous = self.last_at_micros.load(Ordering::Acquire);
        let micros = if now_micros > previous {
            now_micros
        } else {
            previous.saturating_add(1)
        };
        self.last_at_micros.store(micros, Ordering::Release);
        DateTime::from_timestamp_micros(micros).unwrap_or(now)
    }
}

struct SamplerShared {
    registry: Arc<RunRegistry>,
    samples: Arc<dyn SampleRepository>,
    tasks: Mutex<HashMap<RunId, Arc<SamplingTask>>>,
}

impl SamplerShared {
    fn lock_tasks(&self) -> MutexGuard<'_, HashMap<RunId, Arc<SamplingTask>>> {
        match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Removes and cancels in one step; only the first caller sees `true`.
    fn cancel(&self, run_id: RunId) -> bool {
        let mut tasks = self.lock_tasks();
        let Some(task) = tasks.remove(&run_id) else {
            return false;
        };
        task.cancelled.store(true, Ordering::Release);
        true
    }

    async fn sample(&self, run_id: RunId, task: &SamplingTask) {
        let Some(context) = self.registry.get(run_id) else {
            if self.cancel(run_id) {
                debug!(run_id = %run_id, "Run context gone, sampling cancelled");
            }
            return;
        };
        let report = context.snapshot();
        drop(context);
        if task.cancelled.load(Ordering::Acquire) {
            return;
        }
        let sample = RunSample {
            run_id,
            at: task.next_timestamp(),
            report,
        };
        if let Err(err) = self.samples.append(sample).await {
            warn!(run_id = %run_id, "Failed to append sample: {}", err);
        }
    }

    async fn tick(&self) {
        let live: Vec<(RunId, Arc<SamplingTask>)> = self
            .lock_tasks()
            .iter()
            .filter(|(_, task)| task.is_live())
            .map(|(run_id, task)| (*run_id, Arc::clone(task)))
            .collect();
        for (run_id, task) in live {
            self.sample(run_id, &task).await;
        }
    }
}

/// One periodic ticker that snapshots every active run into its time series.
pub struct Sampler {
    shared: Arc<SamplerShared>,
    ticker: JoinHandle<()>,
}

impl Sampler {
    /// Spawns the shared ticker. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(
        registry: Arc<RunRegistry>,
        samples: Arc<dyn SampleRepository>,
        interval: Duration,
    ) -> Self {
        let shared = Arc::new(SamplerShared {
            registry,
            samples,
            tasks: Mutex::new(HashMap::new()),
        });
        let ticker_shared = Arc::clone(&shared);
        let period = interval.max(Duration::from_millis(1));
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first tick completes immediately; runs take their own first sample
            interval.tick().await;
            loop {
                interval.tick().await;
                ticker_shared.tick().await;
            }
        });
        Self { shared, ticker }
    }

    /// Starts sampling a run: one sample right away, then one per tick.
    /// Starting an already-sampled run does nothing.
    pub async fn start(&self, run_id: RunId) {
        let task = {
            let mut tasks = self.shared.lock_tasks();
            if tasks.contains_key(&run_id) {
                return;
            }
            let task = Arc::new(SamplingTask::default());
            tasks.insert(run_id, Arc::clone(&task));
            task
        };
        self.shared.sample(run_id, &task).await;
        task.primed.store(true, Ordering::Release);
    }

    /// Stops sampling a run. Returns `true` only for the call that stopped it.
    pub fn stop(&self, run_id: RunId) -> bool {
        self.shared.cancel(run_id)
    }

    #[must_use]
    pub fn is_sampling(&self, run_id: RunId) -> bool {
        self.shared.lock_tasks().contains_key(&run_id)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.shared.lock_tasks().len()
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}
