use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// 并发限制器：同一时刻最多 `limit` 个任务持有许可
///
/// 克隆后共享同一组许可，另外记录当前占用数与峰值，便于诊断和测试。
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// 许可，drop 时归还
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyLimiter {
    /// `limit` 为 0 时按 1 处理
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        ConcurrencyLimiter {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 等待直到拿到许可
    pub async fn acquire(&self) -> Permit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore is never closed");
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Permit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }

    /// 在许可保护下执行 `fut`，无论结果如何都会释放许可
    pub async fn run<F>(&self, fut: F) -> F::Output
    where
        F: Future,
    {
        let _permit = self.acquire().await;
        fut.await
    }

    /// 最大并发数
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 当前持有许可的任务数
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 历史最大并发数
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn peak_never_exceeds_limit() {
        let limiter = ConcurrencyLimiter::new(3);
        let tasks = (0..20).map(|i| {
            let limiter = limiter.clone();
            async move {
                limiter
                    .run(async move {
                        tokio::time::sleep(Duration::from_millis(2 + (i % 4))).await;
                    })
                    .await
            }
        });
        futures::future::join_all(tasks).await;
        assert_eq!(limiter.peak(), 3);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn permit_released_on_error() {
        let limiter = ConcurrencyLimiter::new(1);
        let result: Result<(), &str> = limiter.run(async { Err("boom") }).await;
        assert!(result.is_err());
        assert_eq!(limiter.in_flight(), 0);
        // 如果许可泄漏，这里会永远等待
        tokio::time::timeout(Duration::from_secs(1), limiter.acquire())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn permit_released_when_dropped_early() {
        let limiter = ConcurrencyLimiter::new(1);
        let pending = limiter.run(tokio::time::sleep(Duration::from_secs(60)));
        let _ = tokio::time::timeout(Duration::from_millis(5), pending).await;
        assert_eq!(limiter.in_flight(), 0);
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(ConcurrencyLimiter::new(0).limit(), 1);
    }
}
