//! Retry and Timeout Strategy
//!
//! チャット補完呼び出しのリトライとタイムアウト

use crate::llm::error::{LlmError, LlmResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

/// リニアバックオフのリトライ方針
///
/// n回目の試行が失敗した後、n × `backoff_unit` 待ってから次を試行する。
/// 各試行は `attempt_timeout` で打ち切られ、打ち切りも失敗として1回分を消費する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_unit: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            backoff_unit,
            attempt_timeout,
        }
    }

    /// n回目の失敗後の待機時間
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }

    /// 操作をリトライ付きで実行
    ///
    /// `operation` には1始まりの試行番号が渡される。
    /// すべての試行が失敗した場合は最後のエラーを返す。
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> LlmResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = LlmResult<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let result = match timeout(self.attempt_timeout, operation(attempt)).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(self.attempt_timeout)),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        kind = e.kind(),
                        error = %e,
                        "AI request attempt failed"
                    );
                    last_error = Some(e);

                    if attempt < self.max_attempts {
                        let delay = self.delay_after(attempt);
                        info!(
                            "Retrying AI request with linear backoff (attempt {}/{}), delay: {:?}",
                            attempt + 1,
                            self.max_attempts,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Internal("retry policy allows no attempts".to_string())))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(200))
    }

    #[test]
    fn test_linear_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .execute(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(LlmError::NetworkError("connection reset".to_string()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: LlmResult<()> = fast_policy()
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(LlmError::from_status(503, "unavailable")) }
            })
            .await;

        assert!(matches!(result, Err(LlmError::ServerError { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_consumes_attempt() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(20));
        let calls = AtomicU32::new(0);
        let result: LlmResult<()> = policy
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(LlmError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sleeps_one_then_two_units() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(60));
        let start = tokio::time::Instant::now();
        let mut attempt_starts = Vec::new();

        let result: LlmResult<()> = policy
            .execute(|_| {
                attempt_starts.push(start.elapsed());
                async { Err(LlmError::NetworkError("connection refused".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(
            attempt_starts,
            vec![Duration::ZERO, Duration::from_secs(1), Duration::from_secs(3)]
        );
        // 最後の失敗の後は待たない
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_zero_attempts() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::from_secs(1));
        let result: LlmResult<()> = policy.execute(|_| async { Ok(()) }).await;
        assert!(matches!(result, Err(LlmError::Internal(_))));
    }
}
