use crate::http::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Position in the interactive login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthStage {
    Idle,
    BrowserLaunched,
    FormFilled,
    WaitingForHuman,
    LoginDetected,
    TokenExtraction,
    Success,
    Failure,
}

/// Something that can tell whether the operator has finished logging in.
#[async_trait]
pub trait LoginProbe: Send + Sync {
    async fn login_detected(&self) -> bool;
}

/// Polls `probe` until it reports a login, the timeout passes, or `cancel` fires.
///
/// The deadline also bounds each probe call, so a hung page cannot stretch
/// the wait past `timeout`.
pub async fn wait_for_login<P>(
    probe: &P,
    timeout: Duration,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<(), ApiError>
where
    P: LoginProbe + ?Sized,
{
    let deadline = Instant::now() + timeout;
    let timed_out = || ApiError::LoginTimeout(timeout.as_secs());

    loop {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled("login wait cancelled".to_string()));
        }

        match tokio::time::timeout_at(deadline, probe.login_detected()).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(_) => return Err(timed_out()),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(timed_out());
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(ApiError::Cancelled("login wait cancelled".to_string()));
            }
            _ = tokio::time::sleep(poll_interval.min(deadline - now)) => {}
        }
    }
}

/// Runs `fut` unless `cancel` fires first.
pub async fn unless_cancelled<F>(cancel: &CancellationToken, step: &str, fut: F) -> Result<F::Output, ApiError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled(format!("login cancelled during {}", step))),
        output = fut => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Never;

    #[async_trait]
    impl LoginProbe for Never {
        async fn login_detected(&self) -> bool {
            false
        }
    }

    struct AfterPolls {
        polls: AtomicUsize,
        succeed_on: usize,
    }

    #[async_trait]
    impl LoginProbe for AfterPolls {
        async fn login_detected(&self) -> bool {
            self.polls.fetch_add(1, Ordering::SeqCst) + 1 >= self.succeed_on
        }
    }

    struct Hangs;

    #[async_trait]
    impl LoginProbe for Hangs {
        async fn login_detected(&self) -> bool {
            futures::future::pending::<()>().await;
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_login_never_detected() {
        let cancel = CancellationToken::new();
        let result = wait_for_login(
            &Never,
            Duration::from_secs(120),
            Duration::from_secs(1),
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(ApiError::LoginTimeout(120))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_probe_still_times_out() {
        let cancel = CancellationToken::new();
        let result = wait_for_login(
            &Hangs,
            Duration::from_secs(5),
            Duration::from_secs(1),
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(ApiError::LoginTimeout(5))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_once_probe_succeeds() {
        let probe = AfterPolls {
            polls: AtomicUsize::new(0),
            succeed_on: 3,
        };
        let cancel = CancellationToken::new();

        wait_for_login(&probe, Duration::from_secs(120), Duration::from_secs(1), &cancel)
            .await
            .unwrap();
        assert_eq!(probe.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_ends_wait_early() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = wait_for_login(
            &Never,
            Duration::from_secs(120),
            Duration::from_secs(1),
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(ApiError::Cancelled(_))));
        assert!(started.elapsed() < Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unless_cancelled_stops_slow_step() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = unless_cancelled(&cancel, "page load", tokio::time::sleep(Duration::from_secs(5))).await;

        assert!(matches!(result, Err(ApiError::Cancelled(msg)) if msg.contains("page load")));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unless_cancelled_passes_output_through() {
        let cancel = CancellationToken::new();
        let result = unless_cancelled(&cancel, "settle", async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
