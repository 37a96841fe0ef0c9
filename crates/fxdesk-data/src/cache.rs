//! 키 기반 TTL 캐시.
//!
//! `get_or_fetch(key, ttl, producer)`는 `key`로 저장된 값이 `ttl`보다 최근이면
//! producer를 호출하지 않고 그 값을 돌려줍니다. 그렇지 않으면 producer를 실행해
//! 결과를 현재 시각과 함께 저장합니다. producer 오류는 저장하지 않고 그대로 전파합니다.
//!
//! # 동시성
//!
//! 캐시 조회와 저장 사이에 락을 잡지 않으므로, 같은 키를 동시에 요청하면 producer가
//! 중복 실행될 수 있습니다. producer는 외부 데이터의 멱등 조회이므로 이를 허용합니다.
//! 엄밀한 1회 실행이 필요하면 키별 락을 추가해야 합니다.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
}

/// 캐시 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// 명시적으로 소유/주입되는 TTL 캐시.
#[derive(Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup<T>(&self, key: &str, ttl: Duration) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= ttl {
            return None;
        }
        // 같은 키에 다른 타입이 저장돼 있으면 미스로 취급
        entry.value.downcast_ref::<T>().cloned()
    }

    /// 유효한 캐시 값이 있으면 반환하고, 없으면 producer 결과를 저장 후 반환.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.lookup::<T>(key, ttl).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = key, "캐시 적중");
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = key, ttl_secs = ttl.as_secs(), "캐시 미스, producer 실행");
        let value = producer().await?;

        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                value: Arc::new(value.clone()),
                stored_at: Instant::now(),
            },
        );
        Ok(value)
    }

    /// 단일 키 무효화.
    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// 전체 삭제 (강제 새로고침용).
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len().await,
        }
    }
}
