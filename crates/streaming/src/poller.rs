use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Scheduling parameters for one poller task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Period between calls; `None` runs the task once.
    pub interval: Option<Duration>,
    /// Floor applied after jitter.
    pub min_interval: Duration,
    /// Symmetric random offset applied to each period.
    pub jitter: Duration,
    /// Run the first call right away instead of after one period.
    pub immediate: bool,
    /// Tags for bulk cancellation via [`Poller::stop_all`].
    pub scope: Vec<String>,
}

impl PollOptions {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            min_interval: Duration::ZERO,
            jitter: Duration::ZERO,
            immediate: false,
            scope: Vec::new(),
        }
    }

    /// A single immediate call, still cancellable through the poller.
    pub fn once() -> Self {
        Self {
            interval: None,
            min_interval: Duration::ZERO,
            jitter: Duration::ZERO,
            immediate: true,
            scope: Vec::new(),
        }
    }

    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    /// Delay before the next periodic call: `interval ± jitter`, never below
    /// `min_interval`. `None` for one-shot tasks.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Duration> {
        let base = self.interval?;
        let jitter_ms = self.jitter.as_millis() as i64;
        let offset_ms = if jitter_ms > 0 {
            rng.gen_range(-jitter_ms..=jitter_ms)
        } else {
            0
        };
        let delay_ms = (base.as_millis() as i64 + offset_ms).max(0) as u64;
        Some(Duration::from_millis(delay_ms).max(self.min_interval))
    }

    fn in_scope(&self, scope: &[&str]) -> bool {
        self.scope.iter().any(|s| scope.contains(&s.as_str()))
    }
}

#[derive(Debug)]
struct PollerTask {
    options: PollOptions,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollerTask {
    fn shutdown(self) {
        self.cancel.cancel();
        self.join.abort();
    }
}

/// Keyed periodic task runner.
///
/// Exactly one task exists per key. Each call receives a fresh
/// `CancellationToken` that fires when the task is stopped, replaced, or when
/// the call overruns its period and a new attempt supersedes it.
///
/// Tasks are spawned on the ambient tokio runtime; `register` must be called
/// from within one.
#[derive(Debug, Default)]
pub struct Poller {
    tasks: BTreeMap<String, PollerTask>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` under `key`, replacing (and cancelling) any existing task.
    pub fn register<F, Fut>(&mut self, key: impl Into<String>, f: F, options: PollOptions)
    where
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        if let Some(prev) = self.tasks.remove(&key) {
            debug!(key = %key, "replacing poller task");
            prev.shutdown();
        }

        let cancel = CancellationToken::new();
        let join = tokio::spawn(run_task(key.clone(), f, options.clone(), cancel.clone()));
        debug!(
            key = %key,
            interval = ?options.interval,
            scope = ?options.scope,
            "poller registered"
        );
        self.tasks.insert(
            key,
            PollerTask {
                options,
                cancel,
                join,
            },
        );
    }

    /// Aborts any in-flight call and clears the timer. Safe on unknown keys.
    pub fn stop(&mut self, key: &str) -> bool {
        match self.tasks.remove(key) {
            Some(task) => {
                debug!(key, "poller stopped");
                task.shutdown();
                true
            }
            None => false,
        }
    }

    /// Stops every task whose scope intersects `scope`. Returns how many stopped.
    pub fn stop_all(&mut self, scope: &[&str]) -> usize {
        let keys: Vec<String> = self
            .tasks
            .iter()
            .filter(|(_, t)| t.options.in_scope(scope))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            self.stop(key);
        }
        keys.len()
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.tasks.contains_key(key)
    }

    /// Registered and not yet finished (one-shot tasks finish after their call).
    pub fn is_running(&self, key: &str) -> bool {
        self.tasks.get(key).is_some_and(|t| !t.join.is_finished())
    }

    pub fn options(&self, key: &str) -> Option<&PollOptions> {
        self.tasks.get(key).map(|t| &t.options)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.tasks.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        for (_, task) in std::mem::take(&mut self.tasks) {
            task.shutdown();
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum CallOutcome {
    Completed,
    Overran,
    Cancelled,
}

async fn run_task<F, Fut>(key: String, mut f: F, options: PollOptions, cancel: CancellationToken)
where
    F: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut outcome = CallOutcome::Completed;
    if options.immediate {
        outcome = run_call(&key, &mut f, &options, &cancel).await;
        if outcome == CallOutcome::Cancelled {
            return;
        }
    }

    loop {
        if outcome != CallOutcome::Overran {
            let Some(delay) = jittered_delay(&options) else {
                return;
            };
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        outcome = run_call(&key, &mut f, &options, &cancel).await;
        if outcome == CallOutcome::Cancelled {
            return;
        }
    }
}

async fn run_call<F, Fut>(
    key: &str,
    f: &mut F,
    options: &PollOptions,
    cancel: &CancellationToken,
) -> CallOutcome
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = ()>,
{
    let call_token = cancel.child_token();
    let call = f(call_token.clone());
    let budget = options.interval.map(|i| i.max(options.min_interval));

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => CallOutcome::Cancelled,
        _ = call => CallOutcome::Completed,
        _ = overrun(budget) => CallOutcome::Overran,
    };

    match outcome {
        CallOutcome::Overran => {
            warn!(key, "poll call overran its interval; starting a fresh attempt");
            call_token.cancel();
        }
        CallOutcome::Cancelled => call_token.cancel(),
        CallOutcome::Completed => {}
    }
    outcome
}

fn jittered_delay(options: &PollOptions) -> Option<Duration> {
    options.next_delay(&mut rand::thread_rng())
}

async fn overrun(budget: Option<Duration>) {
    match budget {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}
