//! Cache layer orchestrating keyed reads and optimistic mutations.
//!
//! Reads are request-keyed: the first read for a key runs the fetcher and
//! populates the cache, later reads are served from memory. Concurrent
//! reads for the same key are deduplicated with a per-key guard, so a burst
//! of readers triggers a single fetch. Mutations patch the cached value in
//! place ("optimistic" - the updater already holds the repository-confirmed
//! result) and are immediately visible to the next read; racing mutations
//! are last-write-wins with no merge.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, StoreError};

use super::storage::CacheStorage;
use super::traits::{Cacheable, QueryKey};

/// Request-keyed cache over a [`CacheStorage`] backend.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  /// Per-key fetch guards; an entry exists only while a fetch is running.
  inflight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl<S: CacheStorage> CacheLayer<S> {
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      inflight: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Read a cached collection, running the fetcher on a miss.
  pub async fn read<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<Vec<T>>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let hash = key.cache_hash();

    if let Some(hit) = self.storage.get(&hash)? {
      return Ok(decode(hit.value)?);
    }

    let gate = self.acquire_gate(&hash).await;
    let _guard = gate.lock().await;

    // A concurrent reader may have populated the cache while we waited.
    if let Some(hit) = self.storage.get(&hash)? {
      self.release_gate(&hash).await;
      return Ok(decode(hit.value)?);
    }

    debug!(query = %key.description(), "cache miss, fetching");
    let data = fetcher().await?;
    self.storage.put(&hash, encode(&data)?)?;
    self.release_gate(&hash).await;

    Ok(data)
  }

  /// Read a single cached entity. A cached JSON null records a confirmed
  /// "absent" so a deleted entity does not refetch on every read.
  pub async fn read_one<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<Option<T>>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
  {
    let hash = key.cache_hash();

    if let Some(hit) = self.storage.get(&hash)? {
      return Ok(decode(hit.value)?);
    }

    let gate = self.acquire_gate(&hash).await;
    let _guard = gate.lock().await;

    if let Some(hit) = self.storage.get(&hash)? {
      self.release_gate(&hash).await;
      return Ok(decode(hit.value)?);
    }

    debug!(query = %key.description(), "cache miss, fetching");
    let data = fetcher().await?;
    self.storage.put(&hash, encode(&data)?)?;
    self.release_gate(&hash).await;

    Ok(data)
  }

  /// Apply an updater to the cached collection for a key.
  ///
  /// With `revalidate = false` the optimistic result is trusted and stored;
  /// the next `read` on the same key sees it without any backing fetch.
  /// With `revalidate = true` the optimistic result is written, then
  /// discarded in favor of a fresh fetch.
  pub async fn mutate<T, K, U, F, Fut>(
    &self,
    key: &K,
    updater: U,
    revalidate: bool,
    fetcher: F,
  ) -> Result<Vec<T>>
  where
    T: Cacheable,
    K: QueryKey,
    U: FnOnce(Vec<T>) -> Vec<T>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let hash = key.cache_hash();

    let current: Vec<T> = match self.storage.get(&hash)? {
      Some(hit) => decode(hit.value)?,
      None => Vec::new(),
    };

    let updated = updater(current);
    self.storage.put(&hash, encode(&updated)?)?;

    if revalidate {
      debug!(query = %key.description(), "revalidating after mutation");
      let fresh = fetcher().await?;
      self.storage.put(&hash, encode(&fresh)?)?;
      return Ok(fresh);
    }

    Ok(updated)
  }

  /// Overwrite (or clear, with `None`) a single-entity cache slot.
  pub fn set_one<T, K>(&self, key: &K, value: Option<&T>) -> Result<()>
  where
    T: Cacheable,
    K: QueryKey,
  {
    self.storage.put(&key.cache_hash(), encode(&value)?)?;
    Ok(())
  }

  /// Drop the cached value for a key; the next read will fetch.
  pub fn invalidate<K: QueryKey>(&self, key: &K) -> Result<()> {
    self.storage.remove(&key.cache_hash())?;
    Ok(())
  }

  async fn acquire_gate(&self, hash: &str) -> Arc<Mutex<()>> {
    let mut inflight = self.inflight.lock().await;
    inflight
      .entry(hash.to_string())
      .or_insert_with(|| Arc::new(Mutex::new(())))
      .clone()
  }

  async fn release_gate(&self, hash: &str) {
    let mut inflight = self.inflight.lock().await;
    inflight.remove(hash);
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      inflight: Arc::clone(&self.inflight),
    }
  }
}

fn encode<T: serde::Serialize>(value: &T) -> std::result::Result<serde_json::Value, StoreError> {
  Ok(serde_json::to_value(value)?)
}

fn decode<T: serde::de::DeserializeOwned>(
  value: serde_json::Value,
) -> std::result::Result<T, StoreError> {
  Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::keys::CollectionKey;
  use crate::cache::storage::{MemoryStorage, NoopStorage};
  use crate::model::{Priority, Task};
  use chrono::Utc;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn task(id: &str) -> Task {
    Task {
      id: id.to_string(),
      title: format!("Task {id}"),
      description: None,
      completed: false,
      priority: Priority::Medium,
      due_date: None,
      project_id: None,
      created_at: Utc::now(),
    }
  }

  fn counting_fetcher(
    count: Arc<AtomicUsize>,
    result: Vec<Task>,
  ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<Vec<Task>>> + Send>> {
    move || {
      count.fetch_add(1, Ordering::SeqCst);
      Box::pin(async move { Ok(result) })
    }
  }

  #[tokio::test]
  async fn second_read_is_served_from_cache() {
    let cache = CacheLayer::new(MemoryStorage::default());
    let count = Arc::new(AtomicUsize::new(0));

    let first = cache
      .read(
        &CollectionKey::Tasks,
        counting_fetcher(count.clone(), vec![task("a")]),
      )
      .await
      .unwrap();
    let second = cache
      .read(
        &CollectionKey::Tasks,
        counting_fetcher(count.clone(), vec![task("b")]),
      )
      .await
      .unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(second[0].id, "a");
  }

  #[tokio::test]
  async fn concurrent_reads_for_one_key_fetch_once() {
    let cache = CacheLayer::new(MemoryStorage::default());
    let count = Arc::new(AtomicUsize::new(0));

    let fetcher = |count: Arc<AtomicUsize>| {
      move || async move {
        count.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(vec![task("a")])
      }
    };

    let (left, right) = tokio::join!(
      cache.read(&CollectionKey::Tasks, fetcher(count.clone())),
      cache.read(&CollectionKey::Tasks, fetcher(count.clone())),
    );

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(left.unwrap(), right.unwrap());
  }

  #[tokio::test]
  async fn optimistic_mutate_is_visible_to_next_read() {
    let cache = CacheLayer::new(MemoryStorage::default());
    let count = Arc::new(AtomicUsize::new(0));

    cache
      .read(
        &CollectionKey::Tasks,
        counting_fetcher(count.clone(), vec![task("a")]),
      )
      .await
      .unwrap();

    let created = task("b");
    cache
      .mutate(
        &CollectionKey::Tasks,
        |mut tasks: Vec<Task>| {
          tasks.push(created.clone());
          tasks
        },
        false,
        counting_fetcher(count.clone(), Vec::new()),
      )
      .await
      .unwrap();

    let tasks: Vec<Task> = cache
      .read(
        &CollectionKey::Tasks,
        counting_fetcher(count.clone(), Vec::new()),
      )
      .await
      .unwrap();

    // One fetch for the initial read; neither the mutation nor the
    // follow-up read hit the fetcher
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].id, "b");
  }

  #[tokio::test]
  async fn revalidating_mutate_trusts_the_fetcher() {
    let cache = CacheLayer::new(MemoryStorage::default());
    let count = Arc::new(AtomicUsize::new(0));

    let result = cache
      .mutate(
        &CollectionKey::Tasks,
        |mut tasks: Vec<Task>| {
          tasks.push(task("optimistic"));
          tasks
        },
        true,
        counting_fetcher(count.clone(), vec![task("confirmed")]),
      )
      .await
      .unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, "confirmed");
  }

  #[tokio::test]
  async fn mutate_on_empty_cache_starts_from_empty_collection() {
    let cache = CacheLayer::new(MemoryStorage::default());
    let count = Arc::new(AtomicUsize::new(0));

    let result = cache
      .mutate(
        &CollectionKey::Tasks,
        |mut tasks: Vec<Task>| {
          assert!(tasks.is_empty());
          tasks.push(task("first"));
          tasks
        },
        false,
        counting_fetcher(count.clone(), Vec::new()),
      )
      .await
      .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(count.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn invalidate_forces_a_refetch() {
    let cache = CacheLayer::new(MemoryStorage::default());
    let count = Arc::new(AtomicUsize::new(0));

    cache
      .read(
        &CollectionKey::Tasks,
        counting_fetcher(count.clone(), vec![task("a")]),
      )
      .await
      .unwrap();
    cache.invalidate(&CollectionKey::Tasks).unwrap();
    cache
      .read(
        &CollectionKey::Tasks,
        counting_fetcher(count.clone(), vec![task("a")]),
      )
      .await
      .unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn read_one_caches_confirmed_absence() {
    let cache = CacheLayer::new(MemoryStorage::default());
    let count = Arc::new(AtomicUsize::new(0));
    let key = CollectionKey::Task {
      id: "gone".to_string(),
    };

    for _ in 0..2 {
      let count = count.clone();
      let found: Option<Task> = cache
        .read_one(&key, move || async move {
          count.fetch_add(1, Ordering::SeqCst);
          Ok(None)
        })
        .await
        .unwrap();
      assert_eq!(found, None);
    }

    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn noop_storage_always_fetches() {
    let cache = CacheLayer::new(NoopStorage);
    let count = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
      cache
        .read(
          &CollectionKey::Tasks,
          counting_fetcher(count.clone(), vec![task("a")]),
        )
        .await
        .unwrap();
    }

    assert_eq!(count.load(Ordering::SeqCst), 3);
  }
}
