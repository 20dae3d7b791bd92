//! 批量并发请求
//!
//! 每一轮把所有缺少的目标同时发出（最多 `concurrency` 个在途），
//! 等这一轮全部完成（无论成功失败）后再计算仍然缺少的目标，进入下一轮。
//! 轮数有上限，每轮之间按指数退避等待。

use crate::config::BatchConfig;
use crate::error::{Error, Result};
use futures::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// 接收单个请求失败的通知
pub trait FailureObserver: Send + Sync {
    fn on_failure(&self, key: &str, error: &Error);
}

/// 把失败写进日志，超时只记警告
#[derive(Debug, Default)]
pub struct LogObserver;

impl FailureObserver for LogObserver {
    fn on_failure(&self, key: &str, error: &Error) {
        if error.is_timeout() {
            warn!("请求超时: {}", key);
        } else {
            error!("请求失败: {}: {}", key, error);
        }
    }
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// 第 `round` 轮失败后，下一轮开始前的等待时间
    pub fn delay(&self, round: u32) -> Duration {
        let factor = 1u32 << round.saturating_sub(1).min(16);
        self.backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for RetryPolicy {
    fn from(config: &BatchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: config.backoff(),
            max_backoff: config.max_backoff(),
        }
    }
}

#[derive(Clone)]
pub struct BatchFetcher {
    concurrency: usize,
    policy: RetryPolicy,
    observer: Arc<dyn FailureObserver>,
}

impl BatchFetcher {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            policy: RetryPolicy::from(config),
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn FailureObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// 并发请求所有目标，直到每个目标都有结果
    ///
    /// 可重试的错误交给 observer 并在下一轮重试；其他错误会在当前轮结束后直接返回。
    /// 轮数用完后返回 [`Error::Unresolved`]。
    pub async fn fetch_all<K, V, F, Fut>(
        &self,
        targets: impl IntoIterator<Item = K>,
        fetch: F,
    ) -> Result<HashMap<K, V>>
    where
        K: Clone + Eq + Hash + Display,
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let mut seen = HashSet::new();
        let targets = targets
            .into_iter()
            .filter(|k| seen.insert(k.clone()))
            .collect::<Vec<_>>();
        let mut results = HashMap::with_capacity(targets.len());
        let mut round = 0;

        loop {
            let missing = targets
                .iter()
                .filter(|k| !results.contains_key(*k))
                .cloned()
                .collect::<Vec<_>>();
            if missing.is_empty() {
                return Ok(results);
            }
            if round >= self.policy.max_attempts {
                let mut keys = missing.iter().map(ToString::to_string).collect::<Vec<_>>();
                keys.sort();
                return Err(Error::Unresolved {
                    attempts: round,
                    keys,
                });
            }
            if round > 0 {
                let delay = self.policy.delay(round);
                info!("{} 个请求失败，{:?} 后重试", missing.len(), delay);
                tokio::time::sleep(delay).await;
            }
            round += 1;
            debug!("第 {} 轮请求: {} 个", round, missing.len());

            let fetch = &fetch;
            let mut pending = stream::iter(missing)
                .map(|key| {
                    let future = fetch(key.clone());
                    async move { (key, future.await) }
                })
                .buffer_unordered(self.concurrency);

            let mut fatal = None;
            while let Some((key, result)) = pending.next().await {
                match result {
                    Ok(value) => {
                        results.entry(key).or_insert(value);
                    }
                    Err(e) if e.is_retryable() => self.observer.on_failure(&key.to_string(), &e),
                    Err(e) => {
                        error!("{}: {}", key, e);
                        fatal.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = fatal {
                return Err(e);
            }
        }
    }

    /// 只请求一个目标，同样遵循重试策略
    pub async fn fetch_one<K, V, F, Fut>(&self, target: K, fetch: F) -> Result<V>
    where
        K: Clone + Eq + Hash + Display,
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let mut map = self.fetch_all(Some(target.clone()), fetch).await?;
        map.remove(&target)
            .ok_or_else(|| Error::Unresolved {
                attempts: self.policy.max_attempts,
                keys: vec![target.to_string()],
            })
    }
}
