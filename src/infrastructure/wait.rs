//! 统一的轮询等待原语
//!
//! 所有对远程 UI 的等待都经过这里：按固定间隔重复检查谓词，
//! 直到成立或超时。超时是软失败还是致命失败由调用方决定。

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::driver::{ControlRef, Locator, UiDriver};

/// 等待策略：超时 + 轮询间隔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(8), Duration::from_millis(200))
    }
}

/// 轮询直到 `probe` 返回 `Some`，超时返回 `None`
///
/// 谓词至少会被检查一次，即使超时为零。
pub async fn poll_until<T, F, Fut>(policy: WaitPolicy, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + policy.timeout;
    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        sleep(policy.interval.min(deadline - now)).await;
    }
}

/// 轮询直到谓词成立
pub async fn wait_until<F, Fut>(policy: WaitPolicy, mut predicate: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    poll_until(policy, || {
        let check = predicate();
        async move { check.await.then_some(()) }
    })
    .await
    .is_some()
}

/// 等待控件出现并返回其句柄
pub async fn wait_for_control<D: UiDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
    policy: WaitPolicy,
) -> DriverResult<ControlRef> {
    debug!("等待控件: {}", locator);
    poll_until(policy, move || async move {
        driver.locate(locator).await.ok().flatten()
    })
    .await
    .ok_or_else(|| DriverError::Timeout {
        what: locator.to_string(),
        timeout_ms: policy.timeout_ms(),
    })
}

/// 等待至少一个控件出现并返回全部匹配
pub async fn wait_for_any<D: UiDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
    policy: WaitPolicy,
) -> DriverResult<Vec<ControlRef>> {
    debug!("等待至少一个控件: {}", locator);
    poll_until(policy, move || async move {
        match driver.locate_all(locator).await {
            Ok(controls) if !controls.is_empty() => Some(controls),
            _ => None,
        }
    })
    .await
    .ok_or_else(|| DriverError::Timeout {
        what: locator.to_string(),
        timeout_ms: policy.timeout_ms(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(timeout_ms: u64) -> WaitPolicy {
        WaitPolicy::new(Duration::from_millis(timeout_ms), Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_succeeds_after_polls() {
        let calls = AtomicUsize::new(0);
        let calls_ref = &calls;
        let ok = wait_until(policy(1_000), move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst) >= 3
        })
        .await;

        assert!(ok);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_times_out() {
        let started = Instant::now();
        let ok = wait_until(policy(500), || async { false }).await;

        assert!(!ok);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_checks_once() {
        let calls = AtomicUsize::new(0);
        let calls_ref = &calls;
        let found = poll_until(policy(0), move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            Some(7)
        })
        .await;

        assert_eq!(found, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
