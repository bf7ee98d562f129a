//! Cancellable polling loops driven by a [`RetryPolicy`].
//!
//! A loop is started with [`start_polling`] and represented by a [`PollHandle`].
//! The owner keeps the handle and must call [`PollHandle::cancel`] before
//! starting a replacement, otherwise two loops poll the same endpoint.
//!
//! The scheduling decisions live in [`PollSession`], which has no timers and
//! can be driven step by step.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use serde::{Deserialize, Serialize};
use wasm_bindgen_futures::spawn_local;

/// Wait times and the attempt ceiling for one polling call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay before the first attempt.
    pub initial_delay_ms: u32,
    pub base_ms: u32,
    /// Upper bound for the delay after a pending answer.
    pub max_ms: u32,
    /// `None` polls until a terminal answer arrives.
    pub max_attempts: Option<u32>,
    /// The pending delay grows by one `base_ms` every `step_every` attempts.
    /// `None` keeps it fixed.
    pub step_every: Option<u32>,
    /// Applied to `base_ms` after a failed probe.
    pub error_multiplier: u32,
}

impl RetryPolicy {
    pub const fn stepped(base_ms: u32, max_ms: u32, max_attempts: u32) -> Self {
        Self {
            initial_delay_ms: base_ms,
            base_ms,
            max_ms,
            max_attempts: Some(max_attempts),
            step_every: Some(10),
            error_multiplier: 2,
        }
    }

    pub const fn fixed(interval_ms: u32) -> Self {
        Self {
            initial_delay_ms: interval_ms,
            base_ms: interval_ms,
            max_ms: interval_ms,
            max_attempts: None,
            step_every: None,
            error_multiplier: 1,
        }
    }

    /// Delay after attempt number `attempt` (1-based) came back non-terminal.
    pub fn delay_after_pending(&self, attempt: u32) -> u32 {
        let factor = match self.step_every {
            Some(step) if step > 0 => 1 + attempt / step,
            _ => 1,
        };
        self.base_ms.saturating_mul(factor).min(self.max_ms)
    }

    pub fn delay_after_error(&self) -> u32 {
        self.base_ms.saturating_mul(self.error_multiplier.max(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::stepped(3000, 30000, 60)
    }
}

/// What a single probe found out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// The task is still running.
    Pending,
    /// A terminal answer was received and applied; stop polling.
    Done,
    /// Transport or application error; try again later.
    Retry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStep {
    Wait(u32),
    Finished,
    Exhausted,
}

/// Attempt bookkeeping for one polling loop.
#[derive(Clone, Debug)]
pub struct PollSession {
    policy: RetryPolicy,
    attempts: u32,
}

impl PollSession {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Counts a new attempt and returns its 1-based number.
    pub fn begin(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub fn record(&self, probe: Probe) -> PollStep {
        if probe == Probe::Done {
            return PollStep::Finished;
        }
        if let Some(max) = self.policy.max_attempts {
            if self.attempts >= max {
                return PollStep::Exhausted;
            }
        }
        match probe {
            Probe::Pending => PollStep::Wait(self.policy.delay_after_pending(self.attempts)),
            _ => PollStep::Wait(self.policy.delay_after_error()),
        }
    }
}

/// Handle to a running polling loop.
#[derive(Clone, Debug, Default)]
pub struct PollHandle {
    cancelled: Rc<Cell<bool>>,
    running: Rc<Cell<bool>>,
}

impl PollHandle {
    /// Stops scheduling further attempts. A probe already in flight still completes.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    pub fn is_active(&self) -> bool {
        self.running.get() && !self.cancelled.get()
    }
}

/// Spawns a polling loop on the local executor.
///
/// `probe` receives the 1-based attempt number and applies whatever it learns
/// before reporting a [`Probe`].
pub fn start_polling<F, Fut>(label: &'static str, policy: RetryPolicy, mut probe: F) -> PollHandle
where
    F: FnMut(u32) -> Fut + 'static,
    Fut: Future<Output = Probe> + 'static,
{
    let handle = PollHandle::default();
    handle.running.set(true);
    let task = handle.clone();
    spawn_local(async move {
        let mut session = PollSession::new(policy);
        let mut delay = policy.initial_delay_ms;
        loop {
            TimeoutFuture::new(delay).await;
            if task.is_cancelled() {
                log::debug!("[{}] cancelled after {} attempts", label, session.attempts());
                break;
            }
            let attempt = session.begin();
            let outcome = probe(attempt).await;
            if attempt == 1 || attempt % 10 == 0 {
                log::debug!("[{}] attempt {} -> {:?}", label, attempt, outcome);
            }
            match session.record(outcome) {
                PollStep::Wait(next) => delay = next,
                PollStep::Finished => {
                    log::info!("[{}] finished after {} attempts", label, attempt);
                    break;
                }
                PollStep::Exhausted => {
                    log::info!("[{}] giving up after {} attempts", label, attempt);
                    break;
                }
            }
        }
        task.running.set(false);
    });
    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_delay_steps_every_ten_attempts_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after_pending(1), 3000);
        assert_eq!(policy.delay_after_pending(9), 3000);
        assert_eq!(policy.delay_after_pending(10), 6000);
        assert_eq!(policy.delay_after_pending(25), 9000);
        assert_eq!(policy.delay_after_pending(59), 18000);
        assert_eq!(policy.delay_after_pending(200), 30000);
        assert_eq!(policy.delay_after_error(), 6000);
    }

    #[test]
    fn fixed_policy_never_grows() {
        let policy = RetryPolicy::fixed(30000);
        assert_eq!(policy.delay_after_pending(1), 30000);
        assert_eq!(policy.delay_after_pending(500), 30000);
        assert_eq!(policy.delay_after_error(), 30000);
    }

    #[test]
    fn retries_stop_at_the_attempt_ceiling() {
        let mut session = PollSession::new(RetryPolicy::default());
        let mut probes = 0;
        loop {
            session.begin();
            probes += 1;
            match session.record(Probe::Retry) {
                PollStep::Wait(delay) => assert_eq!(delay, 6000),
                PollStep::Exhausted => break,
                PollStep::Finished => panic!("retry must not finish"),
            }
        }
        assert_eq!(probes, 60);
    }

    #[test]
    fn done_on_the_last_attempt_finishes() {
        let mut session = PollSession::new(RetryPolicy::default());
        for _ in 0..59 {
            session.begin();
            assert!(matches!(session.record(Probe::Pending), PollStep::Wait(_)));
        }
        session.begin();
        assert_eq!(session.record(Probe::Done), PollStep::Finished);
        assert_eq!(session.attempts(), 60);
    }

    #[test]
    fn unbounded_policy_keeps_waiting() {
        let mut session = PollSession::new(RetryPolicy::fixed(1000));
        for _ in 0..1000 {
            session.begin();
            assert_eq!(session.record(Probe::Pending), PollStep::Wait(1000));
        }
    }

    #[test]
    fn policy_fields_default_when_missing() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"base_ms": 1000}"#).unwrap();
        assert_eq!(policy.base_ms, 1000);
        assert_eq!(policy.max_attempts, Some(60));
        assert_eq!(policy.max_ms, 30000);
    }

    #[test]
    fn fresh_handle_is_inactive() {
        let handle = PollHandle::default();
        assert!(!handle.is_active());
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn quick_policy() -> RetryPolicy {
        RetryPolicy::stepped(1, 1, 60)
    }

    fn counting(answer: impl Fn(u32) -> Probe + 'static) -> (Rc<Cell<u32>>, impl FnMut(u32) -> std::future::Ready<Probe>) {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let check = move |attempt| {
            seen.set(seen.get() + 1);
            std::future::ready(answer(attempt))
        };
        (calls, check)
    }

    async fn until_stopped(handle: &PollHandle) {
        for _ in 0..2000 {
            if !handle.running.get() {
                return;
            }
            TimeoutFuture::new(5).await;
        }
        panic!("polling loop never stopped");
    }

    #[wasm_bindgen_test]
    async fn retries_give_up_after_sixty_calls() {
        let (calls, check) = counting(|_| Probe::Retry);
        let handle = start_polling("test", quick_policy(), check);
        assert!(handle.is_active());
        until_stopped(&handle).await;
        assert_eq!(calls.get(), 60);
        assert!(!handle.is_active());
        assert!(!handle.is_cancelled());
    }

    #[wasm_bindgen_test]
    async fn done_on_call_sixty_stops_the_loop() {
        let (calls, check) = counting(|attempt| if attempt < 60 { Probe::Pending } else { Probe::Done });
        let handle = start_polling("test", quick_policy(), check);
        until_stopped(&handle).await;
        assert_eq!(calls.get(), 60);
    }

    #[wasm_bindgen_test]
    async fn cancel_before_the_first_tick_skips_every_call() {
        let (calls, check) = counting(|_| Probe::Pending);
        let handle = start_polling("test", RetryPolicy { initial_delay_ms: 20, ..quick_policy() }, check);
        handle.cancel();
        assert!(!handle.is_active());
        until_stopped(&handle).await;
        assert_eq!(calls.get(), 0);
    }

    #[wasm_bindgen_test]
    async fn cancel_stops_further_calls() {
        let (calls, check) = counting(|_| Probe::Pending);
        let handle = start_polling("test", quick_policy(), check);
        while calls.get() < 3 {
            TimeoutFuture::new(1).await;
        }
        handle.cancel();
        let at_cancel = calls.get();
        until_stopped(&handle).await;
        TimeoutFuture::new(20).await;
        assert_eq!(calls.get(), at_cancel);
        assert!(at_cancel < 60);
    }
}
